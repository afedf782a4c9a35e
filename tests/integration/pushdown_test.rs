use anyhow::Result;

use insubquery::query::expression::{ArithmeticOp, ExpressionVisitor};
use insubquery::{
    share, CompareOp, DataType, DataValue, ExecutionContext, InSubqueryCondition, ScalarExpr, Settings, TableFilter,
    ValuesSubquery,
};

#[path = "../common/mod.rs"]
mod common;
use common::int_subquery;

fn table(id: u32, alias: &str) -> TableFilter {
    TableFilter::new(
        id,
        alias,
        vec![("id".to_string(), DataType::Integer), ("name".to_string(), DataType::Text)],
    )
}

fn bound_in(filter: &TableFilter, column: &str, rows: &[Option<i64>]) -> Result<InSubqueryCondition> {
    let mut condition = InSubqueryCondition::in_query(ScalarExpr::column(None, column), int_subquery(rows));
    condition.bind(filter, 0)?;
    condition.optimize()?;
    Ok(condition)
}

#[test]
fn test_pushes_independent_in_list() -> Result<()> {
    let mut filter = table(1, "t");
    let condition = bound_in(&filter, "id", &[Some(3), None, Some(1), Some(3)])?;

    assert!(condition.try_push_index_condition(&Settings::default(), &mut filter));
    assert_eq!(filter.index_conditions().len(), 1);
    assert_eq!(filter.index_conditions()[0].column_index(), 0);
    assert_eq!(
        filter.index_conditions()[0].to_string(),
        "id IN(SELECT * FROM (VALUES (3), (NULL), (1), (3)) AS V(v))"
    );

    let ctx = ExecutionContext::new(Settings::default());
    let rows: Vec<Vec<DataValue>> = (0..5)
        .map(|i| vec![DataValue::Integer(i), DataValue::Text(format!("row{}", i))])
        .collect();
    let kept = filter.restrict(rows, &ctx)?;
    let ids: Vec<DataValue> = kept.into_iter().map(|row| row[0].clone()).collect();
    assert_eq!(ids, vec![DataValue::Integer(1), DataValue::Integer(3)]);
    assert_eq!(ctx.registry().open_count(), 0);
    Ok(())
}

#[test]
fn test_disabled_by_settings() -> Result<()> {
    let mut filter = table(1, "t");
    let condition = bound_in(&filter, "id", &[Some(1)])?;
    let settings = Settings { optimize_in_list: false, ..Settings::default() };

    assert!(!condition.try_push_index_condition(&settings, &mut filter));
    assert!(filter.index_conditions().is_empty());
    Ok(())
}

#[test]
fn test_not_pushed_when_subquery_reads_the_filter() -> Result<()> {
    let mut filter = table(1, "t");
    let plan = ValuesSubquery::new(vec![("v".to_string(), DataType::Integer)])
        .with_row(vec![ScalarExpr::binary(
            ScalarExpr::column(Some("t"), "id"),
            ArithmeticOp::Minus,
            ScalarExpr::literal(DataValue::Integer(1)),
        )]);
    let mut condition = InSubqueryCondition::in_query(ScalarExpr::column(Some("t"), "id"), share(plan));
    condition.bind(&filter, 0)?;

    assert!(!condition.try_push_index_condition(&Settings::default(), &mut filter));
    assert!(filter.index_conditions().is_empty());
    Ok(())
}

#[test]
fn test_pushed_when_subquery_reads_another_filter() -> Result<()> {
    let mut t = table(1, "t");
    let u = table(2, "u");
    let plan = ValuesSubquery::new(vec![("v".to_string(), DataType::Integer)])
        .with_row(vec![ScalarExpr::column(Some("u"), "id")]);
    let mut condition = InSubqueryCondition::in_query(ScalarExpr::column(Some("t"), "id"), share(plan));
    condition.bind(&t, 0)?;
    condition.bind(&u, 0)?;

    assert!(condition.try_push_index_condition(&Settings::default(), &mut t));
    assert_eq!(t.index_conditions().len(), 1);
    Ok(())
}

#[test]
fn test_not_pushed_for_non_column_left() -> Result<()> {
    let mut filter = table(1, "t");

    let mut literal = InSubqueryCondition::in_query(ScalarExpr::literal(DataValue::Integer(1)), int_subquery(&[Some(1)]));
    literal.bind(&filter, 0)?;
    assert!(!literal.try_push_index_condition(&Settings::default(), &mut filter));

    let mut arithmetic = InSubqueryCondition::in_query(
        ScalarExpr::binary(
            ScalarExpr::column(Some("t"), "id"),
            ArithmeticOp::Plus,
            ScalarExpr::literal(DataValue::Integer(1)),
        ),
        int_subquery(&[Some(1)]),
    );
    arithmetic.bind(&filter, 0)?;
    assert!(!arithmetic.try_push_index_condition(&Settings::default(), &mut filter));

    assert!(filter.index_conditions().is_empty());
    Ok(())
}

#[test]
fn test_not_pushed_to_other_filter() -> Result<()> {
    let t = table(1, "t");
    let mut u = table(2, "u");
    let condition = bound_in(&t, "id", &[Some(1)])?;

    assert!(!condition.try_push_index_condition(&Settings::default(), &mut u));
    assert!(u.index_conditions().is_empty());
    Ok(())
}

#[test]
fn test_not_pushed_for_quantified_comparisons() -> Result<()> {
    let mut filter = table(1, "t");
    let left = || ScalarExpr::column(Some("t"), "id");
    let candidates = [
        InSubqueryCondition::all(left(), CompareOp::Equal, int_subquery(&[Some(1)])),
        InSubqueryCondition::any(left(), CompareOp::Bigger, int_subquery(&[Some(1)])),
        InSubqueryCondition::any(left(), CompareOp::EqualNullSafe, int_subquery(&[Some(1)])),
    ];
    for mut condition in candidates {
        condition.bind(&filter, 0)?;
        assert!(!condition.try_push_index_condition(&Settings::default(), &mut filter), "{}", condition);
    }
    assert!(filter.index_conditions().is_empty());

    // = ANY is the same predicate as IN
    let mut equal_any = InSubqueryCondition::any(left(), CompareOp::Equal, int_subquery(&[Some(1)]));
    equal_any.bind(&filter, 0)?;
    assert!(equal_any.try_push_index_condition(&Settings::default(), &mut filter));
    Ok(())
}

#[test]
fn test_evaluatable_follows_marking() -> Result<()> {
    let filter = table(1, "t");
    let mut condition = bound_in(&filter, "id", &[Some(1)])?;
    let at_own_level = ExpressionVisitor::Evaluatable { level: 0 };

    assert!(!condition.is_everything(&at_own_level));
    condition.mark_evaluatable(filter.id(), true);
    assert!(condition.is_everything(&at_own_level));
    condition.mark_evaluatable(filter.id(), false);
    assert!(!condition.is_everything(&at_own_level));

    // From one level deeper the column is an outer reference
    assert!(condition.is_everything(&ExpressionVisitor::Evaluatable { level: 1 }));
    assert!(!condition.is_everything(&ExpressionVisitor::NotFromResolver(filter.id())));
    assert!(condition.is_everything(&ExpressionVisitor::NotFromResolver(9)));
    Ok(())
}

#[test]
fn test_cost_includes_left_operand() -> Result<()> {
    let filter = table(1, "t");
    let column = bound_in(&filter, "id", &[Some(1), Some(2)])?;
    let literal = InSubqueryCondition::in_query(ScalarExpr::literal(DataValue::Integer(1)), int_subquery(&[Some(1), Some(2)]));
    assert_eq!(column.estimate_cost(), literal.estimate_cost() + 2);
    Ok(())
}
