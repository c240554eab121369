use prisma_querygen::ast::SchemaDocument;
use prisma_querygen::crud::{client_setup, crud_file_name, crud_module, type_definition};
use prisma_querygen::graph::ModelGraph;
use prisma_querygen::parser::parse_schema;
use prisma_querygen::query::{GenerationRequest, Operation, QueryGenerator, QueryOptions};
use prisma_querygen::summary::render_summary;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;

fn usage(program: &str) {
    eprintln!("Usage: {} <schema.prisma> [options]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -m, --model <name>       Generate a query for this model");
    eprintln!("  -p, --operation <op>     create, read, update, delete, aggregate (default: read)");
    eprintln!("  -f, --fields <a,b,...>   Selected fields (default: all fields)");
    eprintln!("  -r, --request <file>     JSON query options (conditions, sort, pagination, ...)");
    eprintln!("  -c, --client <ident>     Client identifier (default: prisma)");
    eprintln!("  -t, --types              Prepend client setup and a type definition");
    eprintln!("  -o, --output <file>      Output file (default: stdout)");
    eprintln!("      --describe           Print model cards instead of a query");
    eprintln!("      --graph              Print the model graph as JSON");
    eprintln!("      --crud <dir>         Write one CRUD module per model into <dir>");
    eprintln!();
    eprintln!("Without --model, --describe or --graph the parsed schema is printed as JSON.");
}

#[derive(Default)]
struct Options {
    input: PathBuf,
    model: Option<String>,
    operation: Option<String>,
    fields: Option<Vec<String>>,
    request: Option<PathBuf>,
    client: Option<String>,
    types: bool,
    output: Option<PathBuf>,
    describe: bool,
    graph: bool,
    crud_dir: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut options = Options {
        input: PathBuf::from(&args[1]),
        ..Options::default()
    };

    let mut i = 2;
    while i < args.len() {
        let flag = args[i].as_str();
        let mut value = || {
            i += 1;
            args.get(i)
                .cloned()
                .ok_or_else(|| format!("Missing value for {}", flag))
        };
        match flag {
            "-m" | "--model" => options.model = Some(value()?),
            "-p" | "--operation" => options.operation = Some(value()?),
            "-f" | "--fields" => {
                options.fields = Some(
                    value()?
                        .split(',')
                        .map(|f| f.trim().to_string())
                        .filter(|f| !f.is_empty())
                        .collect(),
                )
            }
            "-r" | "--request" => options.request = Some(value()?.into()),
            "-c" | "--client" => options.client = Some(value()?),
            "-o" | "--output" => options.output = Some(value()?.into()),
            "--crud" => options.crud_dir = Some(value()?.into()),
            "-t" | "--types" => options.types = true,
            "--describe" => options.describe = true,
            "--graph" => options.graph = true,
            _ => return Err(format!("Unknown option: {}", flag)),
        }
        i += 1;
    }

    Ok(options)
}

fn init_logger() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|err| eprintln!("Error initializing the global logger: {err}"))
        .ok();
}

fn write_crud_modules(doc: &SchemaDocument, dir: &Path, client: &str) -> Result<(), String> {
    fs::create_dir_all(dir).map_err(|e| format!("Failed to create {}: {}", dir.display(), e))?;
    for model in &doc.models {
        let path = dir.join(crud_file_name(model));
        fs::write(&path, crud_module(model, client))
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
        info!(model = %model.name, path = %path.display(), "wrote CRUD module");
    }
    Ok(())
}

fn generate(doc: &SchemaDocument, options: &Options, model_name: &str, client: &str) -> Result<String, String> {
    let model = doc
        .model(model_name)
        .ok_or_else(|| format!("Unknown model: {}", model_name))?
        .clone();

    let operation: Operation = options
        .operation
        .as_deref()
        .unwrap_or("read")
        .parse()
        .map_err(|e| format!("{}", e))?;

    let fields = options
        .fields
        .clone()
        .unwrap_or_else(|| model.fields.iter().map(|f| f.name.clone()).collect());

    let query_options = match &options.request {
        Some(path) => {
            let json = fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
            serde_json::from_str::<QueryOptions>(&json)
                .map_err(|e| format!("Invalid request file {}: {}", path.display(), e))?
        }
        None => QueryOptions::default(),
    };

    let header = options
        .types
        .then(|| format!("{}\n\n{}\n\n", client_setup(client), type_definition(&model, &fields)));

    let request = GenerationRequest::new(model, operation, fields).with_options(query_options);
    // Enums stay out of the primitive set, so `role Role` is rendered as a relation.
    let query = QueryGenerator::new().with_client(client).generate(&request);

    Ok(format!("{}{}\n", header.unwrap_or_default(), query))
}

fn run(options: &Options) -> Result<String, String> {
    let input = fs::read_to_string(&options.input)
        .map_err(|e| format!("Failed to read {}: {}", options.input.display(), e))?;

    let doc = parse_schema(&input).map_err(|e| format!("Failed to parse schema: {}", e))?;
    let client = options.client.as_deref().unwrap_or("prisma");

    if let Some(dir) = &options.crud_dir {
        write_crud_modules(&doc, dir, client)?;
    }

    if options.describe {
        Ok(render_summary(&doc))
    } else if options.graph {
        serde_json::to_string_pretty(&ModelGraph::from_document(&doc))
            .map(|json| json + "\n")
            .map_err(|e| e.to_string())
    } else if let Some(model_name) = &options.model {
        generate(&doc, options, model_name, client)
    } else if options.crud_dir.is_some() {
        Ok(String::new())
    } else {
        serde_json::to_string_pretty(&doc)
            .map(|json| json + "\n")
            .map_err(|e| e.to_string())
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        usage(&args[0]);
        process::exit(1);
    }

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    init_logger();

    let output = match run(&options) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    match &options.output {
        Some(path) => {
            if let Err(e) = fs::write(path, &output) {
                eprintln!("Failed to write {}: {}", path.display(), e);
                process::exit(1);
            }
        }
        None => print!("{}", output),
    }
}
