//! Tests for the position book and its JSON store

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::config::AddSemantics;
    use rust_decimal_macros::dec;

    fn book(semantics: AddSemantics) -> PositionBook {
        PositionBook::in_memory(std::path::PathBuf::from("unused.json"), semantics)
    }

    #[test]
    fn normalize_accepts_slug_path_and_url() {
        assert_eq!(normalize_market_slug("fed-cuts-march"), "fed-cuts-march");
        assert_eq!(
            normalize_market_slug("fed-decision/fed-cuts-march"),
            "fed-cuts-march"
        );
        assert_eq!(
            normalize_market_slug("https://polymarket.com/event/fed-decision/fed-cuts-march"),
            "fed-cuts-march"
        );
        assert_eq!(
            normalize_market_slug("https://polymarket.com/event/fed-cuts-march?tid=123"),
            "fed-cuts-march"
        );
        assert_eq!(normalize_market_slug("  fed-cuts-march/  "), "fed-cuts-march");
    }

    #[test]
    fn price_bounds_are_exclusive() {
        assert!(validate_price_cents(dec!(0)).is_err());
        assert!(validate_price_cents(dec!(100)).is_err());
        assert!(validate_price_cents(dec!(-3)).is_err());
        assert!(validate_price_cents(dec!(0.5)).is_ok());
        assert!(validate_price_cents(dec!(99.9)).is_ok());
    }

    #[test]
    fn upsert_replaces_existing_price() {
        let mut b = book(AddSemantics::Upsert);
        assert_eq!(
            b.add_or_update("fed-cuts-march", crate::types::Side::Yes, dec!(36), "")
                .unwrap(),
            AddOutcome::Added
        );
        // Same market via URL, same side: replaced, not duplicated
        let outcome = b
            .add_or_update(
                "https://polymarket.com/event/fed-decision/fed-cuts-march",
                crate::types::Side::Yes,
                dec!(38),
                "",
            )
            .unwrap();
        assert_eq!(outcome, AddOutcome::Updated { old_price: dec!(36) });
        assert_eq!(b.len(), 1);
        assert_eq!(b.positions()[0].limit_price_cents, dec!(38));
    }

    #[test]
    fn strict_semantics_rejects_duplicate() {
        let mut b = book(AddSemantics::Strict);
        b.add_or_update("fed-cuts-march", crate::types::Side::Yes, dec!(36), "")
            .unwrap();
        let err = b
            .add_or_update("fed-cuts-march", crate::types::Side::Yes, dec!(40), "")
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(b.positions()[0].limit_price_cents, dec!(36));
    }

    #[test]
    fn same_market_other_side_is_not_a_duplicate() {
        let mut b = book(AddSemantics::Strict);
        b.add_or_update("fed-cuts-march", crate::types::Side::Yes, dec!(36), "")
            .unwrap();
        b.add_or_update("fed-cuts-march", crate::types::Side::No, dec!(60), "")
            .unwrap();
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn edit_changes_price_only() {
        let mut b = book(AddSemantics::Upsert);
        b.add_or_update("alpha", crate::types::Side::Yes, dec!(30), "keep notes")
            .unwrap();
        let outcome = b.edit_price(1, dec!(31)).unwrap();
        assert_eq!(outcome.old_price, dec!(30));
        assert_eq!(outcome.new_price, dec!(31));
        assert_eq!(b.positions()[0].market_slug, "alpha");
        assert_eq!(b.positions()[0].notes, "keep notes");
    }

    #[test]
    fn edit_rejects_bad_index_and_price() {
        let mut b = book(AddSemantics::Upsert);
        b.add_or_update("alpha", crate::types::Side::Yes, dec!(30), "")
            .unwrap();
        assert!(b.edit_price(0, dec!(31)).is_err());
        assert!(b.edit_price(2, dec!(31)).is_err());
        assert!(b.edit_price(1, dec!(101)).is_err());
        assert_eq!(b.positions()[0].limit_price_cents, dec!(30));
    }

    #[test]
    fn bulk_remove_applies_valid_and_reports_invalid() {
        let mut b = book(AddSemantics::Upsert);
        for (slug, price) in [("a", dec!(10)), ("b", dec!(20)), ("c", dec!(30))] {
            b.add_or_update(slug, crate::types::Side::Yes, price, "").unwrap();
        }

        let report = b.remove(&[3, 1, 3, 99]).unwrap();
        assert_eq!(report.out_of_range, vec![99]);
        let removed: Vec<&str> = report
            .removed
            .iter()
            .map(|r| r.position.market_slug.as_str())
            .collect();
        assert_eq!(removed, vec!["c", "a"]);
        assert_eq!(b.len(), 1);
        assert_eq!(b.positions()[0].market_slug, "b");
    }

    #[test]
    fn remove_with_no_valid_index_is_rejected_whole() {
        let mut b = book(AddSemantics::Upsert);
        b.add_or_update("a", crate::types::Side::Yes, dec!(10), "").unwrap();
        assert!(b.remove(&[0, 5]).is_err());
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn bulk_add_counts_added_updated_skipped() {
        let mut b = book(AddSemantics::Strict);
        b.add_or_update("existing", crate::types::Side::No, dec!(40), "")
            .unwrap();

        let text = "\
alpha YES 25
existing NO 45
broken-line YES
bad-side MAYBE 10
bad-price YES abc
too-big YES 150

beta no 62.5";
        let report = b.bulk_add(text);
        assert_eq!(
            report,
            BulkReport {
                added: 2,
                updated: 1,
                skipped: 4
            }
        );
        // Bulk upserts even under strict add semantics
        assert_eq!(b.positions()[0].limit_price_cents, dec!(45));
        assert_eq!(b.len(), 3);
    }

    #[test]
    fn round_trip_preserves_tuples_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("positions.json");

        let mut b = PositionBook::load(path.clone(), AddSemantics::Upsert).unwrap();
        assert!(b.is_empty());
        b.add_or_update("gamma", crate::types::Side::No, dec!(71), "late add")
            .unwrap();
        b.add_or_update("alpha", crate::types::Side::Yes, dec!(12), "")
            .unwrap();
        b.add_or_update("beta", crate::types::Side::Yes, dec!(55), "")
            .unwrap();
        b.save().unwrap();

        let reloaded = PositionBook::load(path, AddSemantics::Upsert).unwrap();
        let tuples: Vec<(String, crate::types::Side, rust_decimal::Decimal)> = reloaded
            .positions()
            .iter()
            .map(|p| (p.market_slug.clone(), p.side, p.limit_price_cents))
            .collect();
        assert_eq!(
            tuples,
            vec![
                ("gamma".to_string(), crate::types::Side::No, dec!(71)),
                ("alpha".to_string(), crate::types::Side::Yes, dec!(12)),
                ("beta".to_string(), crate::types::Side::Yes, dec!(55)),
            ]
        );
        assert_eq!(reloaded.positions()[0].notes, "late add");
    }

    #[test]
    fn load_skips_malformed_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("positions.json");
        std::fs::write(
            &path,
            r#"[
                {"market_slug": "good", "side": "YES", "limit_price_cents": "42"},
                {"market_slug": "no-side"},
                {"market_slug": "bad-price", "side": "NO", "limit_price_cents": "250"}
            ]"#,
        )
        .unwrap();

        let b = PositionBook::load(path, AddSemantics::Upsert).unwrap();
        assert_eq!(b.len(), 1);
        assert_eq!(b.positions()[0].market_slug, "good");
    }

    #[test]
    fn save_replaces_existing_file_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("positions.json");

        let mut b = PositionBook::load(path.clone(), AddSemantics::Upsert).unwrap();
        b.add_or_update("one", crate::types::Side::Yes, dec!(10), "").unwrap();
        b.save().unwrap();
        b.add_or_update("two", crate::types::Side::Yes, dec!(20), "").unwrap();
        b.save().unwrap();

        let reloaded = PositionBook::load(path.clone(), AddSemantics::Upsert).unwrap();
        assert_eq!(reloaded.len(), 2);
        // No temp sibling left behind
        assert!(!path.with_extension("json.tmp").exists());
    }
}
