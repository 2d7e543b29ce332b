extern crate core;

use clap::{Parser, Subcommand};
use log::LevelFilter;

use pgtrack::registry::Value;
use pgtrack::{Result, TrackError, TrackModule};
use pgtrack_abi::ValueType;

/// CLI for pg_track modules
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the module shared object
    #[arg(long, default_value = "target/debug/libpg_track.so")]
    module: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the module's registration manifest
    Show,
    /// Invoke a registered function
    Call {
        /// Function name as registered in the manifest
        #[arg(default_value = "pg_track_version")]
        name: String,
        /// Arguments, coerced to the declared parameter types
        args: Vec<String>,
    },
}

fn main() {
    match run() {
        Ok(0) => {}
        Ok(code) => {
            log::error!("Exiting with code={code}");
            std::process::exit(code);
        }
        Err(e) => {
            log::error!("ERROR: {e}");
            std::process::exit(1)
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    pretty_env_logger::formatted_timed_builder()
        .format_timestamp_millis()
        .filter_level(LevelFilter::Debug)
        .init();

    match cli.command {
        Commands::Show => show_module(&cli.module),
        Commands::Call { name, args } => call_function(&cli.module, &name, &args),
    }
}

fn show_module(module: &str) -> Result<i32> {
    log::debug!("Opening module: '{module}'");
    let module = TrackModule::load(module)?;
    println!("module '{}' (ABI v{})", module.name(), module.magic().abi_version);
    let functions: Vec<_> = module.registry().functions().collect();
    println!("Registered functions[{}]:", functions.len());
    for function in functions {
        let args = function
            .arg_types()
            .iter()
            .map(|t| format!("{t:?}"))
            .collect::<Vec<String>>()
            .join(", ");
        println!(
            "* {}({args}) -> {:?} [{:?}]",
            function.name(),
            function.return_type(),
            function.flags()
        );
    }
    Ok(0)
}

fn call_function(module: &str, name: &str, raw_args: &[String]) -> Result<i32> {
    log::debug!("Opening module: '{module}'");
    let module = TrackModule::load(module)?;
    let function = module
        .registry()
        .function(name)
        .ok_or_else(|| TrackError::UnknownFunction(name.to_string()))?;
    let declared = function.arg_types().to_vec();

    // Surplus arguments stay text; the dispatcher reports the arity error.
    let mut args = Vec::with_capacity(raw_args.len());
    for (index, raw) in raw_args.iter().enumerate() {
        let value = match declared.get(index) {
            Some(&vtype) => coerce(vtype, raw)?,
            None => Value::Text(raw.clone()),
        };
        args.push(value);
    }

    let value = module.call(name, &args)?;
    println!("{value}");
    Ok(0)
}

fn coerce(vtype: ValueType, raw: &str) -> Result<Value> {
    let value = match vtype {
        ValueType::Text => Value::Text(raw.to_string()),
        ValueType::Int32 => Value::Int32(parse(vtype, raw)?),
        ValueType::Int64 => Value::Int64(parse(vtype, raw)?),
        ValueType::Float64 => Value::Float64(parse(vtype, raw)?),
        ValueType::Bool => Value::Bool(parse(vtype, raw)?),
    };
    Ok(value)
}

fn parse<T: std::str::FromStr>(vtype: ValueType, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| TrackError::InvalidArgument(vtype, raw.to_string()))
}
