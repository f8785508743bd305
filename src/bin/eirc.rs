//! CLI: compile a pipeline spec to an EIR document, or compile and run it.
//!
//! Usage:
//!   `eirc compile [OPTIONS] <spec>` prints the EIR document as JSON.
//!   `eirc run [OPTIONS] <spec>` compiles, runs and prints the final primary value.
//!
//! Set RUST_LOG=eir_pipeline=trace for TRACE-level span enter/exit and events.

use clap::{Args, Parser, Subcommand};
use eir_pipeline::compiler::COMPILER_VERSION;
use eir_pipeline::stable_json::to_lossy_json;
use eir_pipeline::{
  CompileOptions, EirDocument, Registry, RunContext, RunOptions, Value, compile_eir,
  load_pipeline_spec, run_eir,
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

/// Compile and run EIR pipelines.
#[derive(Parser, Debug)]
#[command(name = "eirc")]
#[command(
  after_help = r#"Environment variables (override the matching flags when set):
  EIRC_RUN_DIR            Directory for run.log.json (run only).
  EIRC_COMPILER_VERSION   Value recorded in build.compiler_version.

Examples:
  eirc compile pipeline.yaml
  eirc run --data 1.0 --context '{"addend": 2.0}' pipeline.yaml"#
)]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Compile a spec and print the EIR document.
  Compile {
    #[command(flatten)]
    compile: CompileArgs,

    /// Write the document here instead of stdout.
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
  },
  /// Compile a spec (or load an EIR document) and run it.
  Run {
    #[command(flatten)]
    compile: CompileArgs,

    /// Treat the input file as a compiled EIR document (JSON).
    #[arg(long)]
    eir: bool,

    /// Initial primary data as JSON. Default: null.
    #[arg(long, value_name = "JSON")]
    data: Option<String>,

    /// Initial context as a JSON object.
    #[arg(long, value_name = "JSON")]
    context: Option<String>,

    /// Directory for run.log.json. Overridden by EIRC_RUN_DIR if set.
    #[arg(long, value_name = "DIR")]
    run_dir: Option<PathBuf>,

    /// Skip structural validation of the document before running.
    #[arg(long)]
    no_validate: bool,
  },
}

#[derive(Args, Debug)]
struct CompileArgs {
  /// Recorded in build.compiler_version. Overridden by EIRC_COMPILER_VERSION if set.
  #[arg(long, value_name = "VERSION", default_value = COMPILER_VERSION)]
  compiler_version: String,

  /// Omit canonical_pipeline_spec and the derived section from the document.
  #[arg(long)]
  no_embed: bool,

  /// Path to the pipeline spec (.yaml, .yml or .json)
  #[arg(value_name = "spec")]
  spec: PathBuf,
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
    .with_writer(std::io::stderr)
    .init();

  info!("eirc starting");
  let cli = Cli::parse();
  let registry = Registry::builtin();

  match cli.command {
    Command::Compile { compile, out } => {
      let doc = compile_or_exit(&compile, &registry);
      let json = match serde_json::to_string_pretty(&doc) {
        Ok(s) => s,
        Err(e) => {
          eprintln!("Error encoding EIR document: {}", e);
          process::exit(1);
        }
      };
      match out {
        Some(path) => {
          if let Err(e) = fs::write(&path, json) {
            eprintln!("Error writing {}: {}", path.display(), e);
            process::exit(1);
          }
          info!(path = %path.display(), "wrote EIR document");
        }
        None => println!("{}", json),
      }
    }
    Command::Run {
      compile,
      eir,
      data,
      context,
      run_dir,
      no_validate,
    } => {
      let doc = if eir {
        load_document_or_exit(&compile.spec)
      } else {
        compile_or_exit(&compile, &registry)
      };
      let data = data
        .map(|text| parse_json_or_exit("--data", &text))
        .unwrap_or_default();
      let context = match context.map(|text| parse_json_or_exit("--context", &text)) {
        None => RunContext::new(),
        Some(Value::Map(m)) => m,
        Some(_) => {
          eprintln!("Error: --context must be a JSON object");
          process::exit(1);
        }
      };

      // Env vars override flags.
      let run_dir = env::var("EIRC_RUN_DIR").ok().map(PathBuf::from).or(run_dir);
      info!(run_dir = ?run_dir, strict_validation = !no_validate, "options (env or flags)");
      let options = RunOptions {
        strict_validation: !no_validate,
        run_dir,
        trace: None,
      };

      match run_eir(&doc, &registry, data, context, &options).await {
        Ok(outcome) => {
          println!("Pipeline completed.");
          println!("  pipeline_id: {}", doc.identity.pipeline_id);
          println!("  eir_id: {}", doc.identity.eir_id);
          println!("  Steps: {}", outcome.state.provenance.len());
          println!("  Result: {}", to_lossy_json(&outcome.data));
        }
        Err(failure) => {
          eprintln!("Pipeline error: {}", failure.error);
          process::exit(1);
        }
      }
    }
  }
}

fn compile_or_exit(args: &CompileArgs, registry: &Registry) -> EirDocument {
  let spec = match load_pipeline_spec(&args.spec) {
    Ok(s) => s,
    Err(e) => {
      eprintln!("Error reading {}: {}", args.spec.display(), e);
      process::exit(1);
    }
  };
  let options = CompileOptions {
    compiler_version: env::var("EIRC_COMPILER_VERSION")
      .ok()
      .unwrap_or_else(|| args.compiler_version.clone()),
    embed_canonical_spec: !args.no_embed,
    created_at: None,
  };
  match compile_eir(&spec, registry, &options) {
    Ok(doc) => doc,
    Err(e) => {
      eprintln!("Compile error: {}", e);
      process::exit(1);
    }
  }
}

fn load_document_or_exit(path: &Path) -> EirDocument {
  let parsed = fs::read(path)
    .map_err(|e| e.to_string())
    .and_then(|bytes| serde_json::from_slice::<EirDocument>(&bytes).map_err(|e| e.to_string()));
  match parsed {
    Ok(doc) => doc,
    Err(e) => {
      eprintln!("Error reading {}: {}", path.display(), e);
      process::exit(1);
    }
  }
}

fn parse_json_or_exit(flag: &str, text: &str) -> Value {
  match serde_json::from_str::<serde_json::Value>(text) {
    Ok(v) => Value::from(v),
    Err(e) => {
      eprintln!("Error parsing {}: {}", flag, e);
      process::exit(1);
    }
  }
}
