use std::fs;
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;

use clap::{builder::FalseyValueParser, Parser, Subcommand};
use colored::Colorize;
use hotwatch::notify::Event;
use hotwatch::{
    blocking::{Flow, Hotwatch},
    EventKind,
};
use miette::{bail, miette, IntoDiagnostic, Result};

use marie::{asm_failed, Image, RunState, SymbolTable, Terminal};

/// Assembler and interpreter for the MARIE teaching architecture.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.mas` file to run
    path: Option<PathBuf>,

    /// Print every executed instruction to stderr
    #[arg(long, global = true, env = "MARIE_TRACE", value_parser = FalseyValueParser::new())]
    trace: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run text `.mas` or binary `.mex` file directly and output to terminal
    Run {
        /// `.mas` or `.mex` file to run
        name: PathBuf,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
    },
    /// Create binary `.mex` file to run later
    Compile {
        /// `.mas` file to compile
        name: PathBuf,
        /// Destination to output .mex file
        dest: Option<PathBuf>,
    },
    /// Check a `.mas` file without running or outputting binary
    Check {
        /// File to check
        name: PathBuf,
    },
    /// Place a watch on a `.mas` file to receive constant assembler updates
    Watch {
        /// `.mas` file to watch
        name: PathBuf,
    },
}

fn main() -> Result<()> {
    use MsgColor::*;
    let args = Args::parse();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(marie::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    let Some(command) = args.command else {
        if let Some(path) = args.path {
            return run(&path, false, args.trace);
        }
        println!("\n~ marie v{VERSION} ~");
        println!("{SHORT_INFO}");
        return Ok(());
    };

    match command {
        Command::Run { name, minimal } => run(&name, minimal, args.trace),
        Command::Compile { name, dest } => {
            file_message(Green, "Assembling", &name);
            let contents = fs::read_to_string(&name).into_diagnostic()?;
            let (image, _) = assemble(&contents)?;

            let out_file_name = dest.unwrap_or_else(|| name.with_extension("mex"));
            fs::write(&out_file_name, image.to_bytes()).into_diagnostic()?;

            message(Green, "Finished", &format!("emit binary ({} words)", image.len()));
            file_message(Green, "Saved", &out_file_name);
            Ok(())
        }
        Command::Check { name } => {
            file_message(Green, "Checking", &name);
            let contents = fs::read_to_string(&name).into_diagnostic()?;
            let (_, symbols) = assemble(&contents)?;
            message(Green, "Success", "no errors found!");
            for (label, addr) in symbols.iter() {
                message(Cyan, "Label", &format!("{label} at {addr}"));
            }
            Ok(())
        }
        Command::Watch { name } => watch(name),
    }
}

#[allow(unused)]
enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

fn message(color: MsgColor, left: &str, right: &str) {
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    println!("{left:>12} {right}");
}

fn run(name: &Path, minimal: bool, trace: bool) -> Result<()> {
    file_message(MsgColor::Green, "Assembling", name);
    let image = match name.extension().and_then(|ext| ext.to_str()) {
        Some("mex") => {
            let bytes = fs::read(name).into_diagnostic()?;
            Image::from_bytes(&bytes)?
        }
        Some("mas") => {
            let contents = fs::read_to_string(name).into_diagnostic()?;
            assemble(&contents)?.0
        }
        Some(_) => bail!("File has unknown extension. Exiting..."),
        None => bail!("File has no extension. Exiting..."),
    };

    let mut program = RunState::from_image(&image)
        .map_err(|fault| miette!("Program of {} words does not fit in memory: {fault}", image.len()))?;

    message(MsgColor::Green, "Running", "emitted binary");
    let mut terminal = Terminal::new(minimal, trace);
    program.run(&mut terminal);

    file_message(MsgColor::Green, "Completed", name);
    Ok(())
}

fn watch(name: PathBuf) -> Result<()> {
    if !name.exists() {
        bail!("File does not exist. Exiting...")
    }
    // Vim breaks if watching a single file
    let folder_path = match name.parent() {
        Some(pth) if pth.is_dir() => pth.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };

    // Clear screen and move cursor to top left
    print!("\x1B[2J\x1B[2;1H");
    file_message(MsgColor::Green, "Watching", &name);
    message(MsgColor::Cyan, "Help", "press CTRL+C to exit");

    let mut watcher =
        Hotwatch::new_with_custom_delay(Duration::from_millis(500)).into_diagnostic()?;

    watcher
        .watch(folder_path, move |event: Event| match event.kind {
            // Watch remove for vim changes
            EventKind::Modify(_) | EventKind::Remove(_) => {
                print!("\x1B[2J\x1B[2;1H");
                file_message(MsgColor::Green, "Watching", &name);
                message(MsgColor::Green, "Re-checking", "file change detected");
                message(MsgColor::Cyan, "Help", "press CTRL+C to exit");

                // Makes reruns more obvious
                sleep(Duration::from_millis(50));

                let contents = match fs::read_to_string(&name) {
                    Ok(cts) => cts,
                    Err(e) => {
                        eprintln!("{e}. Exiting...");
                        std::process::exit(1)
                    }
                };
                match assemble(&contents) {
                    Ok(_) => message(MsgColor::Green, "Success", "no errors found!"),
                    Err(e) => println!("\n{:?}", e),
                }
                Flow::Continue
            }
            _ => Flow::Continue,
        })
        .into_diagnostic()?;
    watcher.run();
    Ok(())
}

/// Assemble source, printing every diagnostic. Fails if there was at least one.
fn assemble(contents: &str) -> Result<(Image, SymbolTable)> {
    marie::assemble_with_symbols(contents).map_err(|errors| {
        for err in &errors {
            eprintln!("{:?}", err.report(contents));
        }
        asm_failed(errors.len())
    })
}

const SHORT_INFO: &str = r"
Welcome to marie, an assembler and interpreter for the MARIE teaching machine.
Please use `-h` or `--help` to access the usage instructions and documentation.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
