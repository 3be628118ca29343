use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use sformat_patcher::config::{
    apply_patches, check_patches, load_builtin, load_from_path, InspectResult, Location,
    PatchConfig, PatchError, PatchOptions, PatchReport, PatchResult, TargetStatus, Verdict,
};
use sformat_patcher::edit::{IncludeStatus, Outcome};
use sformat_patcher::locate::{default_gradle_home, resolve_targets, DiscoveryContext, Target};
use similar::{ChangeTag, TextDiff};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sformat-patcher")]
#[command(
    about = "Patch std::format out of React Native's graphicsConversions.h",
    long_about = None
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Patch every target file and verify the result
    Apply {
        #[command(flatten)]
        targets: TargetArgs,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Report the patch state of every target without modifying anything
    Verify {
        #[command(flatten)]
        targets: TargetArgs,
    },

    /// List the files that would be patched
    Targets {
        #[command(flatten)]
        targets: TargetArgs,
    },
}

#[derive(Args)]
struct TargetArgs {
    /// React Native project root (auto-detected if not specified)
    #[arg(short, long)]
    project: Option<PathBuf>,

    /// Patch set to use instead of the built-in one
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Patch these files only, skipping target discovery
    #[arg(short, long = "file", value_name = "PATH")]
    files: Vec<PathBuf>,

    /// Gradle user home (defaults to $GRADLE_USER_HOME or ~/.gradle)
    #[arg(long)]
    gradle_home: Option<PathBuf>,

    /// Do not look for copies in the Gradle cache
    #[arg(long)]
    no_gradle: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            targets,
            dry_run,
            diff,
        } => cmd_apply(targets, dry_run, diff),

        Commands::Verify { targets } => cmd_verify(targets),

        Commands::Targets { targets } => cmd_targets(targets),
    }
}

fn load_config(path: Option<&Path>) -> Result<PatchConfig> {
    let config = match path {
        Some(path) => load_from_path(path)?,
        None => load_builtin()?,
    };
    Ok(config)
}

/// Resolve the project root.
///
/// Priority order:
/// 1. Explicit --project flag
/// 2. Nearest ancestor of the current directory with node_modules/react-native
/// 3. The current directory
fn resolve_project(cli_project: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = cli_project {
        return Ok(path);
    }

    let current = env::current_dir()?;
    for ancestor in current.ancestors() {
        if ancestor.join("node_modules/react-native").is_dir() {
            if ancestor != current {
                println!(
                    "{}",
                    format!("Auto-detected project: {}", ancestor.display()).dimmed()
                );
            }
            return Ok(ancestor.to_path_buf());
        }
    }

    Ok(current)
}

/// Load the patch set and turn `args` into concrete target files.
fn prepare(args: TargetArgs) -> Result<(PatchConfig, Vec<Target>)> {
    let config = load_config(args.config.as_deref())?;

    if !args.files.is_empty() {
        let targets = args.files.into_iter().map(Target::explicit).collect();
        return Ok((config, targets));
    }

    let project = resolve_project(args.project)?;
    let gradle_home = if args.no_gradle {
        None
    } else {
        args.gradle_home.or_else(default_gradle_home)
    };

    println!("Project: {}", project.display());
    match &gradle_home {
        Some(path) => println!("Gradle home: {}", path.display()),
        None => println!("Gradle home: {}", "(disabled)".dimmed()),
    }

    let ctx = DiscoveryContext::new(project).with_gradle_home(gradle_home);
    let discovery = resolve_targets(&config, &ctx);
    for warning in &discovery.warnings {
        eprintln!("  {}", format!("Warning: {warning}").yellow());
    }
    let targets = discovery.targets;

    let gradle_ids: Vec<&str> = config
        .targets
        .iter()
        .filter(|t| matches!(t.location, Location::GradleCache { .. }))
        .map(|t| t.id.as_str())
        .collect();
    for id in gradle_ids {
        if ctx.gradle_home.is_some() && !targets.iter().any(|t| t.id == id) {
            println!("{}", format!("  No cached copies found for {id}").dimmed());
        }
    }

    Ok((config, targets))
}

fn describe(target: &Target) -> String {
    match &target.version {
        Some(version) => format!(
            "{} [{}, react-native {}]",
            target.file.display(),
            target.id,
            version
        ),
        None => format!("{} [{}]", target.file.display(), target.id),
    }
}

/// Helper: Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => continue,
        };
        print!("{}", sign);
    }
    println!();
}

#[derive(Default)]
struct Totals {
    patched: usize,
    already_patched: usize,
    unknown: usize,
    skipped: usize,
    failed: usize,
}

fn report_patch(
    report: &PatchReport,
    config: &PatchConfig,
    dry_run: bool,
    show_diff: bool,
    totals: &mut Totals,
) {
    let search = &config.rule.search;
    let replace = &config.rule.replace;

    match report.outcome {
        Outcome::NewlyPatched => println!(
            "  {} Found {} ({} {}), replaced with {}",
            "✓".green(),
            search,
            report.replacements,
            if report.replacements == 1 {
                "occurrence"
            } else {
                "occurrences"
            },
            replace
        ),
        Outcome::AlreadyPatched => {
            println!("  {} Already patched: {} found", "⊙".yellow(), replace)
        }
        Outcome::PatternAbsent => {
            println!(
                "  {} Unknown state: neither {} nor {} found",
                "?".yellow(),
                search,
                replace
            );
            if !report.excerpt.is_empty() {
                println!("  {}", "Nearby lines:".dimmed());
                for line in &report.excerpt {
                    println!("    {}", line.to_string().dimmed());
                }
            }
        }
    }

    if let Some(include) = &config.include {
        match report.include {
            IncludeStatus::Inserted => println!("  {} Added {}", "+".green(), include.marker),
            IncludeStatus::AnchorMissing => eprintln!(
                "  {}",
                format!(
                    "Warning: anchor '{}' not found; {} not inserted",
                    include.anchor, include.marker
                )
                .yellow()
            ),
            IncludeStatus::Present | IncludeStatus::NotRequired => {}
        }
    }

    if report.changed() {
        if dry_run {
            println!("  {}", "[DRY RUN] changes not written".cyan());
        } else if report.written {
            println!("  Patch written.");
        }
        if show_diff {
            display_diff(&report.file, &report.original, &report.patched);
        }
    } else {
        println!("  {}", "No changes needed.".dimmed());
    }

    match &report.verdict {
        Verdict::Success => {
            println!(
                "  {} {}: {} present, {} absent",
                "Verification".bold(),
                "SUCCESS".green(),
                replace,
                search
            );
        }
        Verdict::Failure(violations) => {
            eprintln!("  {} {}", "Verification".bold(), "FAILURE".red());
            for violation in violations {
                eprintln!("    - {}", violation);
            }
        }
        Verdict::Unknown => {
            println!("  {} {}", "Verification".bold(), "UNKNOWN".yellow());
        }
    }

    match (&report.verdict, report.outcome) {
        (Verdict::Failure(_), _) => totals.failed += 1,
        (_, Outcome::NewlyPatched) => totals.patched += 1,
        (_, Outcome::AlreadyPatched) => totals.already_patched += 1,
        (_, Outcome::PatternAbsent) => totals.unknown += 1,
    }
}

fn report_error(error: &PatchError) {
    match error {
        PatchError::NotFound { path } => {
            eprintln!("  {} {}", "✗".red(), "ERROR: file does not exist".red());
            eprintln!("  File: {}", path.display());
        }
        other => eprintln!("  {} {}", "✗".red(), format!("EXCEPTION: {}", other).red()),
    }
}

fn cmd_apply(args: TargetArgs, dry_run: bool, show_diff: bool) -> Result<()> {
    let (config, targets) = prepare(args)?;
    let options = PatchOptions { dry_run };

    if !config.meta.name.is_empty() {
        println!("Patch set: {}", config.meta.name);
    }
    if dry_run {
        println!("{}", "[DRY RUN - no files will be modified]".cyan());
    }
    println!();

    let mut totals = Totals::default();

    for (target, result) in apply_patches(&config, &targets, options) {
        println!("Targeting {}", describe(&target));
        match result {
            Ok(PatchResult::Processed(report)) => {
                report_patch(&report, &config, dry_run, show_diff, &mut totals)
            }
            Ok(PatchResult::SkippedVersion { reason, .. }) => {
                println!("  {} Skipped ({})", "⊘".cyan(), reason);
                totals.skipped += 1;
            }
            Err(e) => {
                report_error(&e);
                totals.failed += 1;
            }
        }
        println!();
    }

    println!("{}", "Summary:".bold());
    println!("  {} patched", format!("{}", totals.patched).green());
    println!(
        "  {} already patched",
        format!("{}", totals.already_patched).yellow()
    );
    println!("  {} unknown", format!("{}", totals.unknown).yellow());
    println!("  {} skipped", format!("{}", totals.skipped).cyan());
    println!("  {} failed", format!("{}", totals.failed).red());

    if totals.failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn present(flag: bool) -> colored::ColoredString {
    if flag {
        "present".green()
    } else {
        "absent".red()
    }
}

fn report_status(status: &TargetStatus, config: &PatchConfig) {
    let v = &status.verification;
    let search_state = if v.search_absent {
        "absent".green()
    } else {
        "present".red()
    };
    println!("  {}: {}", config.rule.search, search_state);
    println!("  {}: {}", config.rule.replace, present(v.replacement_present));
    if let (Some(include), Some(marker_present)) = (&config.include, v.marker_present) {
        println!("  {}: {}", include.marker, present(marker_present));
    }

    if !status.preview.is_empty() {
        println!(
            "  {}",
            format!("Lines containing '{}':", config.diagnostics.keyword).dimmed()
        );
        for line in &status.preview {
            println!("    {}", line);
        }
    }
}

fn cmd_verify(args: TargetArgs) -> Result<()> {
    let (config, targets) = prepare(args)?;

    println!("{}", "Verifying targets...".bold());
    println!();

    let mut clean = 0;
    let mut mismatch = 0;
    let mut skipped = 0;

    for (target, result) in check_patches(&config, &targets) {
        println!("Checking {}", describe(&target));
        match result {
            Ok(InspectResult::Inspected(status)) => {
                if status.is_clean() {
                    println!("  {} {}", "✓".green(), "CLEAN".green());
                    clean += 1;
                } else {
                    eprintln!(
                        "  {} {}",
                        "✗".red(),
                        format!("FAILED ({} still present)", config.rule.search).red()
                    );
                    mismatch += 1;
                }
                report_status(&status, &config);
            }
            Ok(InspectResult::SkippedVersion { reason, .. }) => {
                println!("  {} Skipped ({})", "⊘".cyan(), reason);
                skipped += 1;
            }
            Err(e) => {
                report_error(&e);
                mismatch += 1;
            }
        }
        println!();
    }

    println!("{}", "Summary:".bold());
    println!("  {} clean", format!("{}", clean).green());
    println!("  {} mismatch", format!("{}", mismatch).red());
    println!("  {} skipped", format!("{}", skipped).cyan());

    if mismatch > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_targets(args: TargetArgs) -> Result<()> {
    let (_, targets) = prepare(args)?;
    println!();

    if targets.is_empty() {
        println!("{}", "No target files found".yellow());
        return Ok(());
    }

    for target in &targets {
        let marker = if target.file.exists() {
            "✓".green()
        } else {
            "✗".red()
        };
        println!("{} {}", marker, describe(target));
    }

    Ok(())
}
