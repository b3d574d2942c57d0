use markprice::cart::{CartAdjuster, CartLine, Recalc, RecalcContext};
use markprice::{Decimal, PricingCatalog, SubjectId};
use serde_json::json;

fn d(s: &str) -> Decimal {
    Decimal::from_str_canonical(s).unwrap()
}

fn catalog() -> PricingCatalog {
    let mut catalog = PricingCatalog::new();
    catalog.set_tiers(
        SubjectId::new("mug"),
        json!([
            {"qty_from": 1, "qty_to": 49, "unit_price": "3.00", "source": "supplier-feed"},
            {"qty_from": 50, "qty_to": 0, "unit_price": "2.00", "source": "supplier-feed"}
        ]),
    );
    catalog.set_tiers(
        SubjectId::new("mug-red"),
        json!([{"qty_from": 1, "unit_price": "4.00"}]),
    );
    catalog.set_areas(
        SubjectId::new("mug"),
        json!([{"position": "Front", "technique_ref": "TAMPO", "max_colors": 2}]),
    );
    catalog.set_technique(
        "TAMPO",
        json!({"col_inc": 1, "cliche": "10", "precio_escalas": [{"desde": 1, "price": "0.50", "price_col": "0.10"}]}),
    );
    catalog
}

fn line(id: &str, variation: Option<&str>, quantity: u64) -> CartLine {
    CartLine {
        line_id: id.to_string(),
        product_id: SubjectId::new("mug"),
        variation_id: variation.map(SubjectId::new),
        quantity,
        base_price: d("5.00"),
        customization: None,
    }
}

fn applied(result: Recalc) -> Vec<markprice::AdjustedLine> {
    match result {
        Recalc::Applied(lines) => lines,
        Recalc::Skipped => panic!("expected an applied pass"),
    }
}

#[test]
fn test_variations_without_tiers_share_parent_quantity() {
    let catalog = catalog();
    let lines = vec![line("1", Some("mug-blue"), 30), line("2", Some("mug-green"), 30)];

    let mut ctx = RecalcContext::new();
    let adjusted = applied(CartAdjuster::new(&catalog).apply(&mut ctx, &lines));

    for l in &adjusted {
        assert_eq!(l.subject_id, SubjectId::new("mug"));
        assert_eq!(l.subject_quantity, 60);
        assert_eq!(l.unit_price, d("2.00"));
    }
    // both lines resolved through one memo entry
    assert_eq!(ctx.memo().len(), 1);
    assert_eq!(ctx.memo().hits(), 1);
}

#[test]
fn test_variation_with_own_tiers_is_its_own_subject() {
    let catalog = catalog();
    let lines = vec![line("1", Some("mug-red"), 60), line("2", None, 10)];

    let mut ctx = RecalcContext::new();
    let adjusted = applied(CartAdjuster::new(&catalog).apply(&mut ctx, &lines));

    assert_eq!(adjusted[0].subject_id, SubjectId::new("mug-red"));
    assert_eq!(adjusted[0].unit_price, d("4.00"));
    assert_eq!(adjusted[1].subject_quantity, 10);
    assert_eq!(adjusted[1].unit_price, d("3.00"));
}

#[test]
fn test_no_tiers_falls_back_to_base_price() {
    let catalog = PricingCatalog::new();
    let mut ctx = RecalcContext::new();
    let adjusted = applied(CartAdjuster::new(&catalog).apply(&mut ctx, &[line("1", None, 3)]));

    assert!(adjusted[0].tier.is_none());
    assert_eq!(adjusted[0].unit_price, d("5.00"));
    assert!(adjusted[0].snapshot("order-1", 0).is_none());
}

#[test]
fn test_customization_is_spread_over_line_quantity() {
    let catalog = catalog();
    let mut l = line("1", None, 20);
    l.customization = Some(json!({"0": {"enabled": true, "technique": "TAMPO", "colors": 5}}));

    let mut ctx = RecalcContext::new();
    let adjusted = applied(CartAdjuster::new(&catalog).apply(&mut ctx, &[l]));

    // colours capped at 2 by the area: 20 * 0.50 + 1 * 0.10 * 20 + 2 * 10 = 32
    assert_eq!(adjusted[0].customization.total, d("32"));
    assert_eq!(adjusted[0].customization_per_unit, d("1.6"));
    assert_eq!(adjusted[0].unit_price, d("4.6"));
}

#[test]
fn test_nested_recalculation_is_skipped() {
    let catalog = catalog();
    let lines = vec![line("1", None, 5)];
    let adjuster = CartAdjuster::new(&catalog);

    let mut nested = Vec::new();
    let mut ctx = RecalcContext::new();
    let result = adjuster.apply_with(&mut ctx, &lines, |ctx, _line| {
        assert!(ctx.in_progress());
        nested.push(adjuster.apply(ctx, &lines));
    });

    assert!(matches!(result, Recalc::Applied(_)));
    assert_eq!(nested, vec![Recalc::Skipped]);
    assert!(!ctx.in_progress());

    // the guard is released once the pass ends
    assert!(matches!(adjuster.apply(&mut ctx, &lines), Recalc::Applied(_)));
}

#[test]
fn test_snapshot_captures_resolved_tier() {
    let catalog = catalog();
    let mut ctx = RecalcContext::new();
    let adjusted = applied(CartAdjuster::new(&catalog).apply(&mut ctx, &[line("7", None, 75)]));

    let snapshot = adjusted[0].snapshot("order-9", 1_700_000_000_000).unwrap();
    assert_eq!(snapshot.order_id, "order-9");
    assert_eq!(snapshot.line_id, "7");
    assert_eq!(snapshot.qty_from, 50);
    assert_eq!(snapshot.qty_to, 0);
    assert_eq!(snapshot.unit_price, d("2.00"));
    assert_eq!(snapshot.source.as_deref(), Some("supplier-feed"));
    assert_eq!(snapshot.quantity, 75);
}

#[test]
fn test_catalog_change_invalidates_memo() {
    let mut catalog = catalog();
    let lines = vec![line("1", None, 10)];
    let mut ctx = RecalcContext::new();

    let first = applied(CartAdjuster::new(&catalog).apply(&mut ctx, &lines));
    assert_eq!(first[0].unit_price, d("3.00"));

    catalog.set_tiers(SubjectId::new("mug"), json!([{"qty_from": 1, "unit_price": "2.75"}]));
    let second = applied(CartAdjuster::new(&catalog).apply(&mut ctx, &lines));
    assert_eq!(second[0].unit_price, d("2.75"));
}

#[test]
fn test_demo_catalog_prices_a_customized_line() {
    let path = std::path::Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/catalog.json"));
    let catalog = PricingCatalog::from_path(path).unwrap();

    let mut l = line("1", None, 100);
    l.product_id = SubjectId::new("1042");
    l.customization = Some(json!({"0": {"enabled": true, "technique": "SERIG", "colors": 2}}));

    let mut ctx = RecalcContext::new();
    let adjusted = applied(CartAdjuster::new(&catalog).apply(&mut ctx, &[l]));

    // tier 50-249: 2.65; SERIG: 100 * 0.45 + 1 * 0.20 * 100 + 2 * 18 = 101
    assert_eq!(adjusted[0].customization.total, d("101"));
    assert_eq!(adjusted[0].unit_price, d("3.66"));
}

#[test]
fn test_panicking_callback_releases_the_context() {
    let catalog = catalog();
    let adjuster = CartAdjuster::new(&catalog);
    let lines = vec![line("1", None, 10)];
    let mut ctx = RecalcContext::new();

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        adjuster.apply_with(&mut ctx, &lines, |_, _| panic!("host hook failed"))
    }));
    assert!(outcome.is_err());
    assert!(!ctx.in_progress());

    let adjusted = applied(adjuster.apply(&mut ctx, &lines));
    assert_eq!(adjusted[0].unit_price, d("3.00"));
}

#[test]
fn test_huge_quantities_saturate_instead_of_overflowing() {
    let catalog = catalog();
    let lines = vec![line("1", None, u64::MAX), line("2", None, u64::MAX)];

    let mut ctx = RecalcContext::new();
    let adjusted = applied(CartAdjuster::new(&catalog).apply(&mut ctx, &lines));

    for l in &adjusted {
        assert_eq!(l.subject_quantity, u64::MAX);
        assert_eq!(l.unit_price, d("2.00"));
    }
}

#[test]
fn test_customization_uses_area_at_selected_index() {
    let mut catalog = catalog();
    catalog.set_areas(
        SubjectId::new("mug"),
        json!([
            {"position": "Back"},
            {"position": "Front", "technique_ref": "TAMPO", "max_colors": 1}
        ]),
    );
    let mut l = line("1", None, 100);
    l.customization = Some(json!({
        "1": {"enabled": true, "technique_ref": "TAMPO", "colors": 3}
    }));

    let mut ctx = RecalcContext::new();
    let adjusted = applied(CartAdjuster::new(&catalog).apply(&mut ctx, &[l]));

    // capped to one colour: 100 * 0.50 + 10 cliché, no extra colours
    let area = &adjusted[0].customization.breakdown[&1];
    assert_eq!(area.colors, 1);
    assert_eq!(area.area_total, d("60"));
}
