use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, ValueEnum};

use insubquery::query::expression::ScalarExpr;
use insubquery::{
    share, CompareOp, DataType, DataValue, ExecutionContext, InSubqueryCondition, NullRowPolicy, Settings,
    Truth, ValuesSubquery,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Quantifier {
    In,
    Any,
    All,
}

#[derive(Parser)]
#[command(author, version, about = "Evaluate a quantified subquery predicate over a list of values")]
struct Cli {
    /// Left operand (integer, float, 'text', true/false or NULL)
    #[arg(short, long)]
    left: String,

    /// Comparison operator: =, <=>, <>, <, <=, >, >=
    #[arg(short, long, default_value = "=")]
    op: String,

    /// Quantifier applied to the subquery rows
    #[arg(short, long, value_enum, default_value_t = Quantifier::In)]
    quantifier: Quantifier,

    /// Comma separated subquery rows, NULL allowed
    #[arg(short, long, default_value = "")]
    rows: String,

    /// Declared type of the subquery column
    #[arg(short = 't', long = "type", default_value = "INTEGER")]
    column_type: String,

    /// Disable the distinct-lookup strategy
    #[arg(long)]
    slow: bool,

    /// Keep FALSE for an ALL counterexample even if NULL rows were seen
    #[arg(long)]
    certify_counterexample: bool,
}

/// Parse a literal the way it would appear in a VALUES list
fn parse_value(value_str: &str) -> DataValue {
    let value_str = value_str.trim();
    if let Ok(i) = value_str.parse::<i64>() {
        return DataValue::Integer(i);
    }
    if let Ok(f) = value_str.parse::<f64>() {
        return DataValue::Float(f);
    }
    if value_str.len() >= 2 && value_str.starts_with('\'') && value_str.ends_with('\'') {
        return DataValue::Text(value_str[1..value_str.len() - 1].to_string());
    }
    match value_str.to_lowercase().as_str() {
        "true" => DataValue::Boolean(true),
        "false" => DataValue::Boolean(false),
        "null" => DataValue::Null,
        _ => DataValue::Text(value_str.to_string()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let compare = CompareOp::from_str(&cli.op).map_err(|e| anyhow!(e))?;
    let column_type = DataType::from_str(&cli.column_type).map_err(|e| anyhow!(e))?;
    let values: Vec<DataValue> = if cli.rows.trim().is_empty() {
        Vec::new()
    } else {
        cli.rows.split(',').map(parse_value).collect()
    };

    let query = share(ValuesSubquery::from_values("v", column_type, values));
    let left = ScalarExpr::literal(parse_value(&cli.left));
    let mut condition = match cli.quantifier {
        Quantifier::In if compare != CompareOp::Equal => bail!("IN only supports the = operator"),
        Quantifier::In => InSubqueryCondition::in_query(left, query),
        Quantifier::Any => InSubqueryCondition::any(left, compare, query),
        Quantifier::All => InSubqueryCondition::all(left, compare, query),
    };
    condition.optimize().context("Failed to prepare predicate")?;

    let settings = Settings {
        optimize_in_select: !cli.slow,
        null_row_policy: if cli.certify_counterexample {
            NullRowPolicy::CertifyCounterexample
        } else {
            NullRowPolicy::DemoteToUnknown
        },
        ..Settings::default()
    };
    let ctx = ExecutionContext::new(settings);
    let value = condition.evaluate(&ctx).context("Failed to evaluate predicate")?;
    let truth = Truth::try_from(&value)?;

    println!("{}", condition);
    println!("{}", truth);
    Ok(())
}
