//! `shellhist rules`: manage and preview redaction rules.

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use std::io::Write;

use shellhist_core::{RedactionRule, RuleEngine};

use crate::cli::RulesCommand;
use crate::commands::AppContext;
use crate::ui::output_format;
use crate::ui::theme::ThemeEntry;

pub fn run_rules<W: Write>(ctx: &AppContext, command: &RulesCommand, out: &mut W) -> Result<()> {
    match command {
        RulesCommand::List => list(ctx, out),
        RulesCommand::Add {
            name,
            pattern,
            replacement,
        } => {
            let rule = RedactionRule::new(name.as_str(), pattern.as_str(), replacement.as_str());
            ctx.config_store()
                .add_rule(rule)
                .with_context(|| format!("Could not add rule '{}'", name))?;
            output_format::print_success_message(
                out,
                &format!("Added redaction rule: {}", name),
                &ctx.theme,
                ctx.stdout_color(),
            )?;
            Ok(())
        }
        RulesCommand::Remove { name } => {
            let removed = ctx
                .config_store()
                .remove_rule(name)
                .with_context(|| format!("Could not remove rule '{}'", name))?;
            let msg = if removed == 1 {
                format!("Removed redaction rule: {}", name)
            } else {
                format!("Removed {} redaction rules named {}", removed, name)
            };
            output_format::print_success_message(out, &msg, &ctx.theme, ctx.stdout_color())?;
            Ok(())
        }
        RulesCommand::Test { text } => preview(ctx, text, out),
    }
}

fn list<W: Write>(ctx: &AppContext, out: &mut W) -> Result<()> {
    let rules = ctx.config_store().list_rules()?;
    if rules.is_empty() {
        writeln!(out, "No redaction rules configured.")?;
        writeln!(
            out,
            "\nAdd rules with: shellhist rules add --name \"aws_keys\" --pattern \"AKIA[0-9A-Z]{{16}}\" --replacement \"[AWS_KEY]\""
        )?;
        return Ok(());
    }

    let header = format!("Configured redaction rules ({}), applied in this order:", rules.len());
    writeln!(
        out,
        "{}",
        output_format::styled(&header, ThemeEntry::Header, &ctx.theme, ctx.stdout_color())
    )?;
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Name", "Pattern", "Replacement"]);
    for (i, rule) in rules.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            rule.name.clone(),
            rule.pattern.clone(),
            rule.replacement.clone(),
        ]);
    }
    writeln!(out, "{table}")?;

    let engine = RuleEngine::new(&rules);
    if engine.skipped_rules() > 0 {
        ctx.warn_msg(format!(
            "{} rule(s) are invalid and will be skipped during capture.",
            engine.skipped_rules()
        ));
    }
    Ok(())
}

fn preview<W: Write>(ctx: &AppContext, text: &str, out: &mut W) -> Result<()> {
    let config = ctx.load_config()?;
    let engine = RuleEngine::new(&config.redaction_rules);
    let outcome = engine.redact(text);
    let color = ctx.stdout_color();

    writeln!(
        out,
        "{}",
        output_format::styled(&outcome.text, ThemeEntry::RedactedText, &ctx.theme, color && outcome.redacted)
    )?;
    if outcome.redacted {
        let names: Vec<String> = outcome
            .matched_rules
            .iter()
            .map(|n| output_format::styled(n, ThemeEntry::RuleName, &ctx.theme, color))
            .collect();
        writeln!(out, "Matched rules: {}", names.join(", "))?;
    } else {
        writeln!(out, "No rules matched.")?;
    }
    Ok(())
}
