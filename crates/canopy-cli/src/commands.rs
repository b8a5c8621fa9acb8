use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use canopy_compare::{tree_compare, DiffRecord, MaskSyntax};
use canopy_map::{recursive_delete, Outcome, TreeMapper};
use canopy_types::Tree;
use colored::Colorize;
use tracing::info;

use crate::cli::*;
use crate::config::CliConfig;

pub fn run_command(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = CliConfig::load(cli.config.as_deref())?;
    if let Some(format) = cli.format {
        config.output = format;
    }
    if cli.no_color || !config.color {
        colored::control::set_override(false);
    }

    match cli.command {
        Command::Compare(args) => cmd_compare(args, &config),
        Command::Map(args) => cmd_map(args, &config),
        Command::Prune(args) => cmd_prune(args, &config),
    }
}

fn cmd_compare(args: CompareArgs, config: &CliConfig) -> anyhow::Result<ExitCode> {
    let tree = read_tree(&args.tree)?;
    let mask_doc = read_tree(&args.mask)?;
    let diffs = compare_documents(&tree, &mask_doc, &config.syntax)
        .with_context(|| format!("invalid mask {}", args.mask.display()))?;
    info!(differences = diffs.len(), "compared tree against mask");

    match config.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&diffs)?),
        OutputFormat::Text if diffs.is_empty() => {
            println!("{} Tree matches mask.", "✓".green().bold());
        }
        OutputFormat::Text => {
            for diff in &diffs {
                println!("  {} {}", "✗".red(), diff);
            }
            println!("{} difference(s)", diffs.len().to_string().red().bold());
        }
    }

    Ok(if diffs.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn cmd_map(args: MapArgs, config: &CliConfig) -> anyhow::Result<ExitCode> {
    let tree = read_tree(&args.tree)?;
    let mapped = map_document(&tree, args.delete, args.set)?;
    print_tree(&mapped, config.output);
    Ok(ExitCode::SUCCESS)
}

fn cmd_prune(args: PruneArgs, config: &CliConfig) -> anyhow::Result<ExitCode> {
    let mut tree = read_tree(&args.tree)?;
    let keys: Vec<&str> = args.keys.iter().map(String::as_str).collect();
    let removed = recursive_delete(&mut tree, &keys);
    info!(removed, "pruned keys");
    print_tree(&tree, config.output);
    Ok(ExitCode::SUCCESS)
}

fn compare_documents(
    tree: &Tree,
    mask_doc: &Tree,
    syntax: &MaskSyntax,
) -> anyhow::Result<Vec<DiffRecord>> {
    let mask = syntax.parse(mask_doc)?;
    Ok(tree_compare(tree, &mask))
}

fn map_document(tree: &Tree, delete: Vec<String>, set: Vec<Assignment>) -> anyhow::Result<Tree> {
    let mapper = TreeMapper::new(|t| {
        for path in delete {
            t.when(path, |_, _| Outcome::Delete);
        }
        for Assignment { path, value } in set {
            t.when(path, move |_, _| value.clone());
        }
    })
    .context("no transforms given; pass --delete or --set")?;
    Ok(mapper.apply(tree)?)
}

fn read_tree(path: &Path) -> anyhow::Result<Tree> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        text
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };
    Tree::from_json_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn print_tree(tree: &Tree, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", tree.to_json_pretty()),
        OutputFormat::Json => println!("{}", tree.to_json_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_compare::{Actual, Expected};
    use canopy_types::tree;
    use std::io::Write;

    fn json_file(doc: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(doc.as_bytes()).unwrap();
        file
    }

    #[test]
    fn read_tree_from_file() {
        let file = json_file(r#"{"a": [1, 2]}"#);
        assert_eq!(read_tree(file.path()).unwrap(), tree!({"a": [1, 2]}));
    }

    #[test]
    fn read_tree_reports_bad_json() {
        let file = json_file("{not json");
        let err = read_tree(file.path()).unwrap_err();
        assert!(err.to_string().contains("is not valid JSON"));
    }

    #[test]
    fn compare_reports_differences() {
        let tree = tree!({"a": 1, "b": [1, 2, 3], "c": "x"});
        let mask = tree!({"a": 2, "b": [1, "*"], "c": "+", "d": "-"});
        let diffs = compare_documents(&tree, &mask, &MaskSyntax::default()).unwrap();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, "a");
        assert_eq!(diffs[0].tree, Actual::Value(tree!(1)));
        assert_eq!(diffs[0].mask, Expected::Value(tree!(2)));
    }

    #[test]
    fn compare_rejects_interior_tail() {
        let err = compare_documents(&tree!([1]), &tree!([1, "*", 2]), &MaskSyntax::default())
            .unwrap_err();
        assert!(err.to_string().contains("index 1"), "{err}");
    }

    #[test]
    fn map_deletes_and_sets() {
        let tree = tree!({"a": {"b": 1, "c": 2}, "d": [1, 2], "e": "old"});
        let out = map_document(
            &tree,
            vec!["a/b".into(), "d[]".into()],
            vec![Assignment { path: "e".into(), value: tree!({"new": true}) }],
        )
        .unwrap();
        assert_eq!(out, tree!({"a": {"c": 2}, "d": [], "e": {"new": true}}));
    }

    #[test]
    fn map_without_transforms_fails() {
        let err = map_document(&tree!({}), Vec::new(), Vec::new()).unwrap_err();
        assert!(err.to_string().contains("no transforms given"));
    }

    #[test]
    fn map_reports_kind_errors() {
        let err = map_document(&tree!({"a": 1}), vec!["a[]".into()], Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "expected a sequence at 'a', got a number");
    }
}
