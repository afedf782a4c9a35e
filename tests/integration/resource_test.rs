use std::sync::Arc;

use anyhow::Result;

use insubquery::{
    share, CompareOp, DataType, DataValue, ExecutionContext, InSubqueryCondition, QueryError, ResourceRegistry,
    ScalarExpr, Settings, TableFilter, ValuesSubquery,
};

#[path = "../common/mod.rs"]
mod common;
use common::{int_subquery, int_values, CountingSubquery, FailingSubquery};

fn counting(values: &[Option<i64>]) -> (CountingSubquery, Arc<common::ProbeStats>) {
    CountingSubquery::new(ValuesSubquery::from_values("v", DataType::Integer, int_values(values)))
}

#[test]
fn test_probe_closed_on_every_outcome() -> Result<()> {
    let (plan, stats) = counting(&[Some(1), None, Some(3)]);
    let query = share(plan);
    let ctx = ExecutionContext::new(Settings::default());
    let slow = ExecutionContext::new(Settings { optimize_in_select: false, ..Settings::default() });

    for left in [1, 2, 9] {
        let mut condition = InSubqueryCondition::in_query(ScalarExpr::literal(DataValue::Integer(left)), query.clone());
        condition.optimize()?;
        condition.evaluate(&ctx)?;
        condition.evaluate(&slow)?;
    }

    // NULL left returns before any row is read
    let mut null_left = InSubqueryCondition::all(ScalarExpr::literal(DataValue::Null), CompareOp::Bigger, query);
    null_left.optimize()?;
    assert_eq!(null_left.evaluate(&ctx)?, DataValue::Null);

    assert_eq!(stats.runs(), 7);
    assert_eq!(stats.closes(), stats.runs());
    assert_eq!(ctx.registry().open_count(), 0);
    assert_eq!(slow.registry().open_count(), 0);
    assert_eq!(ctx.registry().total_registered(), 4);
    Ok(())
}

#[test]
fn test_probe_closed_on_empty_result() -> Result<()> {
    let (plan, stats) = counting(&[]);
    let mut condition = InSubqueryCondition::all(ScalarExpr::literal(DataValue::Integer(1)), CompareOp::Smaller, share(plan));
    condition.optimize()?;
    let ctx = ExecutionContext::new(Settings::default());

    assert_eq!(condition.evaluate(&ctx)?, DataValue::Boolean(true));
    assert_eq!(stats.closes(), 1);
    assert_eq!(ctx.registry().open_count(), 0);
    Ok(())
}

#[test]
fn test_probe_closed_after_conversion_error() -> Result<()> {
    let (plan, stats) = counting(&[Some(1), Some(2)]);
    let mut condition = InSubqueryCondition::in_query(ScalarExpr::literal(DataValue::Text("two".to_string())), share(plan));
    condition.optimize()?;

    for settings in [Settings::default(), Settings { optimize_in_select: false, ..Settings::default() }] {
        let ctx = ExecutionContext::new(settings);
        let err = condition.evaluate(&ctx).unwrap_err();
        assert!(matches!(err, QueryError::TypeConversion { .. }), "unexpected error: {}", err);
        assert_eq!(ctx.registry().open_count(), 0);
    }
    assert_eq!(stats.runs(), 2);
    assert_eq!(stats.closes(), 2);
    Ok(())
}

#[test]
fn test_subquery_failure_propagates() -> Result<()> {
    let mut condition = InSubqueryCondition::in_query(ScalarExpr::literal(DataValue::Integer(1)), share(FailingSubquery));
    condition.optimize()?;
    let ctx = ExecutionContext::new(Settings::default());

    let err = condition.evaluate(&ctx).unwrap_err();
    assert!(matches!(err, QueryError::ExecutionError(_)));
    assert_eq!(ctx.registry().total_registered(), 0);
    assert_eq!(ctx.registry().open_count(), 0);
    Ok(())
}

#[test]
fn test_left_operand_failure_releases_probe() -> Result<()> {
    let (plan, stats) = counting(&[Some(1)]);
    // Unbound column: the subquery has already been opened when this fails
    let mut condition = InSubqueryCondition::in_query(ScalarExpr::column(None, "missing"), share(plan));
    condition.optimize()?;
    let ctx = ExecutionContext::new(Settings::default());

    let err = condition.evaluate(&ctx).unwrap_err();
    assert!(matches!(err, QueryError::ColumnNotFound(_)));
    assert_eq!(stats.closes(), 1);
    assert_eq!(ctx.registry().open_count(), 0);
    Ok(())
}

#[test]
fn test_registry_shared_across_contexts() -> Result<()> {
    let registry = Arc::new(ResourceRegistry::new());
    let first = ExecutionContext::with_registry(Settings::default(), Arc::clone(&registry));
    let second = ExecutionContext::with_registry(Settings::default(), Arc::clone(&registry));

    let mut in_query = InSubqueryCondition::in_query(ScalarExpr::literal(DataValue::Integer(2)), int_subquery(&[Some(2)]));
    in_query.optimize()?;
    let mut all = InSubqueryCondition::all(ScalarExpr::literal(DataValue::Integer(2)), CompareOp::BiggerEqual, int_subquery(&[Some(1), Some(2)]));
    all.optimize()?;

    assert_eq!(in_query.evaluate(&first)?, DataValue::Boolean(true));
    assert_eq!(all.evaluate(&second)?, DataValue::Boolean(true));
    assert_eq!(in_query.evaluate(&second)?, DataValue::Boolean(true));

    assert_eq!(registry.total_registered(), 3);
    assert_eq!(registry.open_count(), 0);
    assert!(registry.open_resources().is_empty());
    Ok(())
}

#[test]
fn test_index_condition_probe_released() -> Result<()> {
    let (plan, stats) = counting(&[Some(1), Some(1), Some(2)]);
    let mut filter = TableFilter::new(1, "t", vec![("id".to_string(), DataType::Integer)]);
    let mut condition = InSubqueryCondition::in_query(ScalarExpr::column(Some("t"), "id"), share(plan));
    condition.bind(&filter, 0)?;
    condition.optimize()?;
    assert!(condition.try_push_index_condition(&Settings::default(), &mut filter));

    let ctx = ExecutionContext::new(Settings::default());
    let rows = vec![vec![DataValue::Integer(1)], vec![DataValue::Integer(3)]];
    assert_eq!(filter.restrict(rows, &ctx)?, vec![vec![DataValue::Integer(1)]]);
    assert_eq!(stats.runs(), 1);
    assert_eq!(stats.closes(), 1);
    assert_eq!(ctx.registry().open_count(), 0);
    Ok(())
}
