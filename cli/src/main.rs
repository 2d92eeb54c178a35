mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use agent::{Agent, AgentConfig, AgentError, EchoGenerator, Tool, ToolOutput};
use interro::{Block, Document, EscapeRule, Instruction, ParseError, ParseOptions, Syntax};

#[derive(Parser)]
#[command(name = "interro", version, about = "Annotated-block document tools")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Block marker dialect (default: from config, else detected)
    #[arg(long, global = true, value_enum)]
    syntax: Option<SyntaxArg>,

    /// How backslashes in prompts are read (default: from config, else counting)
    #[arg(long, global = true, value_enum)]
    escape: Option<EscapeArg>,

    /// Agent config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log more (-v info, -vv debug, -vvv trace); RUST_LOG also works
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum SyntaxArg {
    Auto,
    Bang,
    Query,
}

#[derive(Clone, Copy, ValueEnum)]
enum EscapeArg {
    Counting,
    TwoState,
}

impl From<EscapeArg> for EscapeRule {
    fn from(arg: EscapeArg) -> Self {
        match arg {
            EscapeArg::Counting => EscapeRule::Counting,
            EscapeArg::TwoState => EscapeRule::TwoState,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print the document with all block markup removed
    Render(FileArgs),

    /// Print the parsed blocks
    Parse(ParseArgs),

    /// Parse only (exit 0 if valid)
    Check(FileArgs),

    /// Print critique instructions
    Critique(InstructionArgs),

    /// Print improve instructions (read-only blocks are refused)
    Improve(InstructionArgs),

    /// Invoke an agent tool by name and print its JSON output
    Tool(ToolArgs),

    /// Run .test.md test files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct FileArgs {
    /// Document to read
    file: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum ParseFormat {
    Tree,
    Debug,
    Json,
}

#[derive(clap::Args)]
struct ParseArgs {
    /// Document to read
    file: String,

    #[arg(short, long, value_enum, default_value_t = ParseFormat::Tree)]
    format: ParseFormat,
}

#[derive(clap::Args)]
struct InstructionArgs {
    /// Document to read
    file: String,

    /// Only this block (any depth); otherwise every top-level block
    #[arg(short, long)]
    block: Option<String>,

    /// Show what a text generator would receive, including the system prompt
    #[arg(long)]
    dry_run: bool,
}

#[derive(clap::Args)]
struct ToolArgs {
    /// One of: render, parse, critique, improve
    name: String,

    /// Document to read
    file: String,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.md file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

/// Everything a subcommand needs besides its own arguments.
struct Context {
    color_choice: ColorChoice,
    syntax: Option<SyntaxArg>,
    escape: Option<EscapeArg>,
    config: AgentConfig,
}

impl Context {
    fn parse_options(&self, source: &str) -> ParseOptions {
        let syntax = match self.syntax {
            Some(SyntaxArg::Bang) => Syntax::Bang,
            Some(SyntaxArg::Query) => Syntax::Query,
            Some(SyntaxArg::Auto) => Syntax::detect(source),
            None => self.config.parse_options(source).syntax,
        };
        ParseOptions {
            syntax,
            escape_rule: self.escape.map_or(self.config.escape, EscapeRule::from),
        }
    }

    /// Read and parse `file`, printing a diagnostic and exiting on failure.
    fn load(&self, file: &str) -> (String, Document) {
        let source = match std::fs::read_to_string(file) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: cannot read '{}': {}", file, e);
                process::exit(1);
            }
        };

        let mut files = SimpleFiles::new();
        let file_id = files.add(file.to_string(), source.clone());
        let options = self.parse_options(&source);
        log::debug!("parsing {} with {:?}", file, options);

        match interro::Parser::new(source.clone(), file_id)
            .with_options(options)
            .parse()
        {
            Ok(doc) => (source, doc),
            Err(error) => {
                self.emit_parse_error(&files, &error);
                process::exit(1);
            }
        }
    }

    fn emit_parse_error(&self, files: &SimpleFiles<String, String>, error: &ParseError) {
        let writer = StandardStream::stderr(self.color_choice);
        let config = term::Config::default();
        let diagnostic = error.to_diagnostic();
        let _ = term::emit_to_write_style(&mut writer.lock(), &config, files, &diagnostic);
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => match AgentConfig::load_from_path(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        },
        None => AgentConfig::default(),
    };

    let ctx = Context {
        color_choice: if cli.no_color {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        },
        syntax: cli.syntax,
        escape: cli.escape,
        config,
    };

    match cli.command {
        Command::Render(args) => {
            let (_, doc) = ctx.load(&args.file);
            print!("{}", doc.render());
        }
        Command::Parse(args) => do_parse(&ctx, args),
        Command::Check(args) => {
            let (_, doc) = ctx.load(&args.file);
            eprintln!(
                "ok: {} parsed successfully ({} blocks)",
                args.file,
                doc.block_count()
            );
        }
        Command::Critique(args) => do_instruction(&ctx, Instruction::Critique, args),
        Command::Improve(args) => do_instruction(&ctx, Instruction::Improve, args),
        Command::Tool(args) => do_tool(&ctx, args),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(log::LevelFilter::Info);
        }
        2 => {
            builder.filter_level(log::LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
        }
    }
    builder.init();
}

fn exit_with(error: impl std::fmt::Display) -> ! {
    eprintln!("error: {}", error);
    process::exit(1);
}

fn do_parse(ctx: &Context, args: ParseArgs) {
    let (_, doc) = ctx.load(&args.file);
    match args.format {
        ParseFormat::Tree => {
            fn print_blocks(blocks: &[Block], indent: usize) {
                for block in blocks {
                    let pad = "  ".repeat(indent);
                    println!("{}{} [{}] {}", pad, block.name, block.access, block.prompt);
                    print_blocks(&block.children, indent + 1);
                }
            }
            print_blocks(doc.blocks(), 0);
        }
        ParseFormat::Debug => println!("{:#?}", doc.blocks()),
        ParseFormat::Json => match ToolOutput::Blocks(doc.blocks().to_vec()).to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => exit_with(e),
        },
    }
}

fn do_instruction(ctx: &Context, instruction: Instruction, args: InstructionArgs) {
    let (source, doc) = ctx.load(&args.file);

    if args.dry_run {
        let agent = match Agent::new(ctx.config.clone(), EchoGenerator) {
            Ok(agent) => agent,
            Err(e) => exit_with(e),
        };
        let answered = match &args.block {
            Some(name) => agent
                .respond_to(&doc, instruction, name)
                .map(|block| vec![block]),
            None => agent.respond(&doc, instruction),
        };
        match answered {
            Ok(blocks) => {
                for block in blocks {
                    println!("{}\n{}\n", block.name, block.response.unwrap_or_default());
                }
            }
            Err(e) => exit_with(e),
        }
        return;
    }

    let result: Result<String, AgentError> = match (&args.block, instruction) {
        (Some(name), Instruction::Critique) => doc.criticise_block(name).map_err(Into::into),
        (Some(name), Instruction::Improve) => doc.improve_block(name).map_err(Into::into),
        (None, Instruction::Critique) => agent::tools::critique(&source, doc.options()),
        (None, Instruction::Improve) => agent::tools::improve(&source, doc.options()),
    };
    match result {
        Ok(text) => print!("{}", text),
        Err(e) => exit_with(e),
    }
}

fn do_tool(ctx: &Context, args: ToolArgs) {
    let tool: Tool = match args.name.parse() {
        Ok(tool) => tool,
        Err(e) => exit_with(e),
    };
    let (source, doc) = ctx.load(&args.file);
    match tool
        .invoke(&source, doc.options())
        .and_then(|output| output.to_json())
    {
        Ok(json) => println!("{}", json),
        Err(e) => exit_with(e),
    }
}
