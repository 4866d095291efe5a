use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use incant_core::{
    parse, resolve, to_command, transpile, validate, ActionTemplates, AliasTable, Bindings,
    ContractSchema, Program, SemanticWarning,
};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Incant command language toolchain.
#[derive(Parser)]
#[command(name = "incant", version, about = "Incant command language toolchain")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a command and print its AST
    Parse {
        /// The command string, e.g. 'write "email" !short'
        command: String,
        /// Alias table JSON file (defaults to the built-in vocabulary)
        #[arg(long)]
        aliases: Option<PathBuf>,
    },

    /// Transpile a command to a natural-language prompt
    Transpile {
        /// The command string
        command: String,
        /// Placeholder binding, name=value (repeatable)
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,
        /// Alias table JSON file (defaults to the built-in vocabulary)
        #[arg(long)]
        aliases: Option<PathBuf>,
        /// Action template JSON file (defaults to the built-in templates)
        #[arg(long)]
        templates: Option<PathBuf>,
        /// Append output-format instructions for a contract schema JSON file
        #[arg(long)]
        contract: Option<PathBuf>,
    },

    /// Recover a command string from a natural-language prompt (best effort)
    Reverse {
        /// The prompt text
        prompt: String,
        /// Action template JSON file (defaults to the built-in templates)
        #[arg(long)]
        templates: Option<PathBuf>,
    },

    /// Validate a structured reply against a contract schema
    Check {
        /// Contract schema JSON file (array of field descriptors)
        #[arg(long)]
        schema: PathBuf,
        /// Structured reply JSON file
        #[arg(long)]
        reply: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { command, aliases } => {
            cmd_parse(&command, aliases.as_deref(), cli.output);
        }
        Commands::Transpile {
            command,
            vars,
            aliases,
            templates,
            contract,
        } => {
            cmd_transpile(
                &command,
                &vars,
                aliases.as_deref(),
                templates.as_deref(),
                contract.as_deref(),
                cli.output,
            );
        }
        Commands::Reverse { prompt, templates } => {
            cmd_reverse(&prompt, templates.as_deref(), cli.output);
        }
        Commands::Check { schema, reply } => {
            cmd_check(&schema, &reply, cli.output);
        }
    }
}

fn cmd_parse(command: &str, aliases: Option<&Path>, output: OutputFormat) {
    let table = load_aliases(aliases, output);
    let mut program = match parse(command) {
        Ok(p) => p,
        Err(e) => {
            report_error(&e, output);
            process::exit(1);
        }
    };
    let warnings = resolve(&mut program, &table);
    print_warnings(&warnings);
    print_program(&program, output);
}

fn cmd_transpile(
    command: &str,
    vars: &[String],
    aliases: Option<&Path>,
    templates: Option<&Path>,
    contract: Option<&Path>,
    output: OutputFormat,
) {
    let table = load_aliases(aliases, output);
    let action_templates = match templates {
        Some(path) => match ActionTemplates::from_json(&read_file(path, output)) {
            Ok(t) => t,
            Err(e) => {
                report_error(&e, output);
                process::exit(1);
            }
        },
        None => ActionTemplates::builtin(),
    };

    let mut bindings = Bindings::new();
    for var in vars {
        match var.split_once('=') {
            Some((name, value)) => {
                bindings.insert(name.to_string(), value.to_string());
            }
            None => {
                eprintln!("invalid --var '{}': expected NAME=VALUE", var);
                process::exit(1);
            }
        }
    }

    let mut program = match parse(command) {
        Ok(p) => p,
        Err(e) => {
            report_error(&e, output);
            process::exit(1);
        }
    };
    let warnings = resolve(&mut program, &table);
    print_warnings(&warnings);

    let mut prompt = match transpile(&program, &table, &action_templates, &bindings) {
        Ok(text) => text,
        Err(e) => {
            report_error(&e, output);
            process::exit(1);
        }
    };

    if let Some(path) = contract {
        let schema = load_schema(path, output);
        prompt = format!("{}\n\n{}", prompt, schema.prompt_instructions());
    }

    match output {
        OutputFormat::Text => println!("{}", prompt),
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "prompt": prompt }));
        }
    }
}

fn cmd_reverse(prompt: &str, templates: Option<&Path>, output: OutputFormat) {
    let action_templates = match templates {
        Some(path) => match ActionTemplates::from_json(&read_file(path, output)) {
            Ok(t) => t,
            Err(e) => {
                report_error(&e, output);
                process::exit(1);
            }
        },
        None => ActionTemplates::builtin(),
    };

    let command = to_command(prompt, &action_templates);
    match output {
        OutputFormat::Text => println!("{}", command),
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "command": command }));
        }
    }
}

fn cmd_check(schema_path: &Path, reply_path: &Path, output: OutputFormat) {
    let schema = load_schema(schema_path, output);
    let reply: serde_json::Value = match serde_json::from_str(&read_file(reply_path, output)) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{}: not valid JSON: {}", reply_path.display(), e);
            process::exit(1);
        }
    };

    match validate(&schema, &reply) {
        Ok(result) => match output {
            OutputFormat::Json => {
                let pretty = serde_json::to_string_pretty(&result.to_json())
                    .unwrap_or_else(|e| format!("serialization error: {}", e));
                println!("{}", pretty);
            }
            OutputFormat::Text => {
                for (name, value) in result.iter() {
                    match value.as_text() {
                        Some(text) => println!("{} = {}", name, text),
                        None => println!("{} = {}", name, value.to_json()),
                    }
                }
            }
        },
        Err(e) => {
            match output {
                OutputFormat::Json => {
                    let failures = serde_json::to_string_pretty(&e.failures)
                        .unwrap_or_else(|_| format!("{:?}", e));
                    eprintln!("{}", failures);
                }
                OutputFormat::Text => {
                    for failure in &e.failures {
                        eprintln!("{}", failure);
                    }
                }
            }
            process::exit(1);
        }
    }
}

// ── Helpers ──────────────────────────────────────────────

fn load_aliases(path: Option<&Path>, output: OutputFormat) -> AliasTable {
    match path {
        Some(path) => match AliasTable::from_json(&read_file(path, output)) {
            Ok(table) => table,
            Err(e) => {
                report_error(&e, output);
                process::exit(1);
            }
        },
        None => AliasTable::builtin(),
    }
}

fn load_schema(path: &Path, output: OutputFormat) -> ContractSchema {
    match ContractSchema::from_json(&read_file(path, output)) {
        Ok(schema) => schema,
        Err(e) => {
            report_error(&e, output);
            process::exit(1);
        }
    }
}

fn read_file(path: &Path, _output: OutputFormat) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("{}: {}", path.display(), e);
            process::exit(1);
        }
    }
}

fn print_warnings(warnings: &[SemanticWarning]) {
    for warning in warnings {
        eprintln!("warning: {}", warning);
    }
}

fn print_program(program: &Program, output: OutputFormat) {
    match output {
        OutputFormat::Json => {
            let pretty = serde_json::to_string_pretty(program)
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
        OutputFormat::Text => {
            println!("{:#?}", program);
        }
    }
}

fn report_error(error: &dyn std::fmt::Display, output: OutputFormat) {
    match output {
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": error.to_string() }));
        }
        OutputFormat::Text => {
            eprintln!("{}", error);
        }
    }
}
