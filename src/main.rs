//! elfshim - patch and launch glibc-2.28-linked executables on older hosts.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use memmap2::Mmap;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use elfshim::elf::{ElfImage, Sym64, SYM_GLOBAL_FUNC, SYM_WEAK_FUNC};
use elfshim::patch::{self, StrTab, SymbolEdit, TARGET_SYMBOL};
use elfshim::runtime::bootstrap::{self, ProcessSnapshot};

/// Patch and launch glibc-2.28-linked executables on older hosts.
#[derive(Parser, Debug)]
#[command(name = "elfshim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (0=quiet, 1=warnings, 2=info, 3=debug)
    #[arg(short, long, default_value = "1")]
    verbosity: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Patch an executable in place and exit
    Patch {
        /// Executable to patch (e.g., /opt/node/bin/node)
        executable: PathBuf,
    },

    /// Launch a program with the forwarding shim preloaded
    Run {
        /// Path to libelfshim.so (default: next to this executable)
        #[arg(long)]
        shim: Option<PathBuf>,

        /// Program to launch
        program: PathBuf,

        /// Arguments passed through to the program
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<std::ffi::OsString>,
    },

    /// Show the patch-relevant state of an executable without modifying it
    Inspect {
        /// Executable to inspect
        executable: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbosity);

    match cli.command {
        Commands::Patch { executable } => cmd_patch(executable),
        Commands::Run {
            shim,
            program,
            args,
        } => cmd_run(shim, program, args),
        Commands::Inspect { executable } => cmd_inspect(executable),
    }
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        _ => Level::DEBUG,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .finish();

    tracing::subscriber::set_global_default(subscriber).ok();
}

fn cmd_patch(executable: PathBuf) -> Result<()> {
    let report = patch::patch_file(&executable)
        .with_context(|| format!("failed to patch {}", executable.display()))?;

    match (report.dependency_removed, report.symbol) {
        (false, SymbolEdit::NotFound | SymbolEdit::AlreadyWeak) => {
            println!("nothing to patch (already clean)");
        }
        _ => {
            if report.dependency_removed {
                println!("removed {} dependency on {}", patch::TARGET_VERSION, patch::TARGET_LIBRARY);
            }
            if report.symbol == SymbolEdit::Weakened {
                println!("weakened {TARGET_SYMBOL}");
            }
        }
    }
    println!(
        "all clear, now run `elfshim run {} [args...]`",
        executable.display()
    );
    Ok(())
}

fn cmd_run(shim: Option<PathBuf>, program: PathBuf, args: Vec<std::ffi::OsString>) -> Result<()> {
    let shim_path = bootstrap::resolve_shim_path(shim).context("failed to locate libelfshim.so")?;

    // The environment comes from the kernel's record of this process, not
    // from libc. The exec argv comes from the parsed command instead: the
    // raw command line may still carry a `--` escape that must not be
    // handed to the target.
    let snapshot = ProcessSnapshot::capture().context("failed to snapshot process state")?;
    debug!(
        cmdline = snapshot.args.len(),
        env = snapshot.env.len(),
        "captured process record"
    );
    let argv = bootstrap::command_argv(program.as_os_str(), &args)?;

    let err = bootstrap::launch(&argv, &snapshot.env, &shim_path).unwrap_err();
    Err(err).with_context(|| format!("failed to launch {}", program.display()))
}

fn cmd_inspect(executable: PathBuf) -> Result<()> {
    let file = std::fs::File::open(&executable)
        .with_context(|| format!("failed to open {}", executable.display()))?;
    let map = unsafe { Mmap::map(&file) }
        .with_context(|| format!("failed to map {}", executable.display()))?;
    let image = ElfImage::parse(&map)
        .with_context(|| format!("not a patchable image: {}", executable.display()))?;

    println!("Executable: {}", executable.display());
    println!("Sections:");
    for (name, section) in [
        (".dynstr", image.dynstr),
        (".gnu.version_r", image.verneed),
        (".symtab", image.symtab),
        (".strtab", image.strtab),
    ] {
        println!(
            "  {:16} {:#10x}  {:>8} bytes",
            name, section.offset, section.size
        );
    }

    println!("\nVersion requirements:");
    let requirements = patch::list_requirements(&map, image.dynstr, image.verneed)?;
    for (library, versions) in &requirements {
        let marker = if library == patch::TARGET_LIBRARY
            && versions.iter().any(|v| v == patch::TARGET_VERSION)
        {
            "  <- patch target"
        } else {
            ""
        };
        println!("  {} [{}]{}", library, versions.join(", "), marker);
    }

    print!("\nSymbol {TARGET_SYMBOL}: ");
    match find_symbol_info(&map, &image, TARGET_SYMBOL) {
        Some(SYM_GLOBAL_FUNC) => println!("global function (patchable)"),
        Some(SYM_WEAK_FUNC) => println!("weak function (already patched)"),
        Some(st_info) => println!("unexpected kind {st_info:#04x}"),
        None => println!("not present"),
    }

    Ok(())
}

fn find_symbol_info(data: &[u8], image: &ElfImage, name: &str) -> Option<u8> {
    use zerocopy::FromBytes;

    let name_offset = StrTab::new(image.strtab.bytes(data)).find(name)?;
    let count = image.symtab.size / Sym64::SIZE;
    for i in 0..count {
        let at = image.symtab.offset + i * Sym64::SIZE;
        let (sym, _) = Sym64::read_from_prefix(&data[at..]).ok()?;
        if sym.st_name as usize == name_offset {
            return Some(sym.st_info);
        }
    }
    None
}
