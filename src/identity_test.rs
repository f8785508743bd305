//! Tests for identity computation.

use std::collections::BTreeSet;

use serde_json::json;

use crate::compiler::{CompileOptions, compile_eir};
use crate::identity::{
  EIR_ID_PREFIX, NODE_NAMESPACE, SemanticModule, eir_id, node_uuid, pipeline_variant_id,
};
use crate::registry::Registry;
use crate::spec_loader::PipelineSpec;
use crate::types::{EIR_VERSION, PayloadForm, Value};

fn compiled() -> crate::types::EirDocument {
  let spec = PipelineSpec::from_nodes(vec![
    Value::from(json!({"processor": "FloatValueSource", "parameters": {"value": 1.0}})),
    Value::from(json!({"processor": "FloatAddOperation", "parameters": {"addend": 2.0}})),
  ]);
  compile_eir(&spec, &Registry::builtin(), &CompileOptions::default()).unwrap()
}

#[test]
fn node_uuid_is_v5_under_the_nil_namespace() {
  let basis = json!({"b": 1, "a": 2});
  let id = node_uuid(&basis).unwrap();
  let expected = uuid::Uuid::new_v5(&NODE_NAMESPACE, br#"{"a":2,"b":1}"#);
  assert_eq!(id, expected.to_string());
}

#[test]
fn variant_id_depends_on_module_set_not_its_order() {
  let a = BTreeSet::from([SemanticModule::PayloadForms, SemanticModule::SlotInference]);
  let b = BTreeSet::from([SemanticModule::SlotInference, SemanticModule::PayloadForms]);
  let c = BTreeSet::from([SemanticModule::PayloadForms]);
  let id_a = pipeline_variant_id(EIR_VERSION, "plid-x", &a).unwrap();
  assert_eq!(id_a, pipeline_variant_id(EIR_VERSION, "plid-x", &b).unwrap());
  assert_ne!(id_a, pipeline_variant_id(EIR_VERSION, "plid-x", &c).unwrap());
  assert!(id_a.starts_with("pvid-"));
  assert_eq!(id_a.len(), "pvid-".len() + 64);
}

#[test]
fn module_names_are_dotted_for_payload_form_variants() {
  assert_eq!(SemanticModule::ChannelForm.to_string(), "payload_forms.channel");
  assert_eq!(SemanticModule::LaneBundleForm.name(), "payload_forms.lane_bundle");
}

#[test]
fn eir_id_ignores_source_build_and_its_own_value() {
  let doc = compiled();
  let mut other = doc.clone();
  other.identity.eir_id = "eirid-whatever".to_string();
  other.build.created_at = "1999-01-01T00:00:00Z".to_string();
  other.build.compiler_version = "other".to_string();
  other.source.pipeline_spec_fingerprint = "feed".to_string();
  other.derived = None;
  other.canonical_pipeline_spec = None;
  assert_eq!(eir_id(&other).unwrap(), doc.identity.eir_id);
  assert!(doc.identity.eir_id.starts_with(EIR_ID_PREFIX));
}

#[test]
fn semantics_change_moves_eir_id_but_not_pipeline_id() {
  let doc = compiled();
  let mut other = doc.clone();
  other.semantics.payload_forms.terminal_form = PayloadForm::LaneBundle;
  assert_ne!(eir_id(&other).unwrap(), doc.identity.eir_id);
  assert_eq!(other.identity.pipeline_id, doc.identity.pipeline_id);
}

#[test]
fn lineage_participates_in_eir_id() {
  let doc = compiled();
  let mut other = doc.clone();
  other.lineage.insert("parent".to_string(), Value::from("eirid-abc"));
  assert_ne!(eir_id(&other).unwrap(), doc.identity.eir_id);
}
