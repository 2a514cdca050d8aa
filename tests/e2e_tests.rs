//! End-to-end integration tests
//!
//! Fixture tests run the CLI command path against CSV files under
//! tests/fixtures/. Each fixture directory holds:
//! - `input.csv` - the uploaded statement
//! - `expected.csv` - the row-error report printed for it
//!
//! All fixtures share the reference data in tests/fixtures/seed.toml.
//!
//! The remaining tests drive the library API directly to check what ends up
//! in the transaction store: categories, types, idempotent re-uploads,
//! chunking and cancellation.

#[cfg(test)]
mod tests {
    use clap::Parser;
    use fin_aggregator::cli::{self, CliArgs};
    use fin_aggregator::core::transaction_store::partition_key;
    use fin_aggregator::io::parse_reference_data;
    use fin_aggregator::{
        BatchConfig, BatchProcessor, InMemoryReferenceStore, InMemoryTransactionStore, Registry,
        Transaction, TransactionType, UploadError, UploadService,
    };
    use rstest::rstest;
    use rust_decimal::Decimal;
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::NamedTempFile;
    use tokio_util::sync::CancellationToken;

    const SEED: &str = "tests/fixtures/seed.toml";
    const HIGH_STREET: i64 = 1;
    const AMEX: i64 = 2;
    const REVOLUT: i64 = 3;
    const MONZO: i64 = 4;
    const USER: i64 = 42;

    type Service = UploadService<InMemoryReferenceStore, InMemoryTransactionStore>;

    /// Upload a fixture through the CLI and compare the report with expected.csv
    async fn run_test_fixture(fixture_name: &str, bank: i64) {
        let fixture_dir = format!("tests/fixtures/{}", fixture_name);
        let input_path = format!("{}/input.csv", fixture_dir);
        let expected_path = format!("{}/expected.csv", fixture_dir);

        assert!(
            Path::new(&input_path).exists(),
            "Input file not found: {}",
            input_path
        );

        let args = CliArgs::try_parse_from([
            "fin-aggregator",
            "--seed",
            SEED,
            "upload",
            "--bank",
            &bank.to_string(),
            "--user",
            &USER.to_string(),
            "--chunk-size",
            "2",
            &input_path,
        ])
        .unwrap();

        let mut temp_output = NamedTempFile::new().expect("Failed to create temp file");
        cli::run(args, &mut temp_output)
            .await
            .unwrap_or_else(|e| panic!("Failed to upload {}: {}", input_path, e));
        temp_output.flush().expect("Failed to flush temp file");

        let actual = fs::read_to_string(temp_output.path()).expect("Failed to read output");
        let expected = fs::read_to_string(&expected_path).expect("Failed to read expected output");

        assert_eq!(
            normalize(&actual),
            normalize(&expected),
            "Report mismatch for fixture '{}'",
            fixture_name
        );
    }

    fn normalize(csv: &str) -> Vec<String> {
        csv.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    #[rstest]
    #[case("base_mixed", HIGH_STREET)]
    #[case("short_rows", HIGH_STREET)]
    #[case("bom_header", HIGH_STREET)]
    #[case("revolut_clean", REVOLUT)]
    #[tokio::test]
    async fn test_fixtures(#[case] fixture: &str, #[case] bank: i64) {
        run_test_fixture(fixture, bank).await;
    }

    #[tokio::test]
    async fn test_cli_rejects_missing_required_header() {
        let mut input = NamedTempFile::new().unwrap();
        writeln!(input, "Date,Description\n2024-03-01,Coffee").unwrap();
        let path = input.path().display().to_string();

        let args = CliArgs::try_parse_from([
            "fin-aggregator", "--seed", SEED, "upload", "--bank", "1", "--user", "42", &path,
        ])
        .unwrap();

        let mut output = Vec::new();
        let result = cli::run(args, &mut output).await;
        assert_eq!(result, Err("1 of 1 files rejected".to_string()));
    }

    #[tokio::test]
    async fn test_cli_import_feed() {
        let mut feed = NamedTempFile::new().unwrap();
        write!(
            feed,
            r#"{{"transactions": [
                {{"id": "tx_1", "amount": -1099, "description": "NETFLIX", "created": "2024-03-05T21:03:19Z"}},
                {{"id": "tx_2", "amount": 500, "created": "soon"}}
            ]}}"#
        )
        .unwrap();
        let path = feed.path().display().to_string();

        let args = CliArgs::try_parse_from([
            "fin-aggregator", "--seed", SEED, "import-feed", "--bank", "4", "--user", "42", &path,
        ])
        .unwrap();

        let mut output = Vec::new();
        cli::run(args, &mut output).await.unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "error,external_id\nunknown date format: soon,tx_2\n"
        );
    }

    // Library-level scenarios

    struct Harness {
        service: Service,
        store: Arc<InMemoryTransactionStore>,
    }

    async fn harness(chunk_size: usize) -> Harness {
        let seed = fs::read_to_string(SEED).unwrap();
        let reference = Arc::new(InMemoryReferenceStore::new(parse_reference_data(&seed).unwrap()));
        let registry = Arc::new(Registry::new(reference));
        registry.initialize().await.unwrap();

        let store = Arc::new(InMemoryTransactionStore::new());
        let processor = BatchProcessor::new(Arc::clone(&store), BatchConfig::new(chunk_size, 4));
        Harness {
            service: UploadService::new(registry, processor),
            store,
        }
    }

    fn by_reference<'a>(rows: &'a [Transaction], reference: &str) -> &'a Transaction {
        rows.iter()
            .find(|tx| tx.external_id == reference)
            .unwrap_or_else(|| panic!("transaction {} not stored", reference))
    }

    #[tokio::test]
    async fn test_three_row_upload_reports_second_data_row() {
        let h = harness(100).await;
        let content = b"Date,Amount,Description\n\
            2024-03-01,-5.00,Coffee\n2024-03-02,abc,Lunch\n2024-03-03,-7.00,Dinner\n";

        let report = h
            .service
            .upload(HIGH_STREET, USER, content, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.row_errors.len(), 1);
        assert_eq!(report.row_errors[&3], vec!["invalid amount format: abc".to_string()]);
        assert_eq!(h.store.len(), 3);

        // The failing row is persisted with defaults.
        let lunch = h
            .store
            .transactions_for(HIGH_STREET, USER)
            .into_iter()
            .find(|tx| tx.description == "Lunch")
            .unwrap();
        assert!(lunch.amount.is_none());
    }

    #[tokio::test]
    async fn test_categories_and_base_types() {
        let h = harness(100).await;
        let content = fs::read("tests/fixtures/base_mixed/input.csv").unwrap();

        h.service
            .upload(HIGH_STREET, USER, &content, CancellationToken::new())
            .await
            .unwrap();

        let rows = h.store.transactions_for(HIGH_STREET, USER);
        assert_eq!(rows.len(), 6);

        let netflix = by_reference(&rows, "r1");
        assert_eq!(netflix.category_id, 7);
        assert_eq!(netflix.tx_type, TransactionType::Outcome);
        assert_eq!(netflix.amount, Some(Decimal::new(-1299, 2)));

        let tesco = by_reference(&rows, "r2");
        assert_eq!(tesco.category_id, 3);

        let salary = by_reference(&rows, "r3");
        assert_eq!(salary.tx_type, TransactionType::Income);
        assert_eq!(salary.category_id, 1);
        assert_eq!(partition_key(salary.transaction_date), "2024_03");

        let undated = by_reference(&rows, "r5");
        assert!(undated.transaction_date.is_none());
    }

    #[tokio::test]
    async fn test_amex_forces_outcome_except_transfers() {
        let h = harness(100).await;
        let content = b"Date,Description,Amount,Reference\n\
            01/03/2024,NETFLIX.COM,12.99,a1\n\
            02/03/2024,PAYMENT RECEIVED - THANK YOU,-500.00,a2\n\
            03/03/2024,CORNER SHOP,+4.10,a3\n";

        let report = h
            .service
            .upload(AMEX, USER, content, CancellationToken::new())
            .await
            .unwrap();
        assert!(report.is_clean());

        let rows = h.store.transactions_for(AMEX, USER);
        assert_eq!(by_reference(&rows, "a1").tx_type, TransactionType::Outcome);
        assert_eq!(by_reference(&rows, "a3").tx_type, TransactionType::Outcome);

        let payment = by_reference(&rows, "a2");
        assert_eq!(payment.category_id, 9);
        assert_eq!(payment.tx_type, TransactionType::Unspecified);
    }

    #[tokio::test]
    async fn test_revolut_sign_convention() {
        let h = harness(100).await;
        let content = fs::read("tests/fixtures/revolut_clean/input.csv").unwrap();

        h.service
            .upload(REVOLUT, USER, &content, CancellationToken::new())
            .await
            .unwrap();

        let rows = h.store.transactions_for(REVOLUT, USER);
        let types: Vec<TransactionType> = rows.iter().map(|tx| tx.tx_type).collect();
        assert_eq!(
            types,
            vec![
                TransactionType::Outcome,
                TransactionType::Income,
                TransactionType::Outcome
            ]
        );
        assert_eq!(rows[1].category_id, 9);
    }

    #[tokio::test]
    async fn test_reupload_does_not_duplicate() {
        let h = harness(2).await;
        let content = fs::read("tests/fixtures/base_mixed/input.csv").unwrap();

        let first = h
            .service
            .upload(HIGH_STREET, USER, &content, CancellationToken::new())
            .await
            .unwrap();
        let second = h
            .service
            .upload(HIGH_STREET, USER, &content, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(first.persisted, 6);
        assert_eq!(second.persisted, 0);
        assert_eq!(first.row_errors, second.row_errors);
        assert_eq!(h.store.len(), 6);
    }

    #[tokio::test]
    async fn test_reupload_without_references_does_not_duplicate() {
        let h = harness(100).await;
        let content = fs::read("tests/fixtures/revolut_clean/input.csv").unwrap();

        for _ in 0..2 {
            h.service
                .upload(REVOLUT, USER, &content, CancellationToken::new())
                .await
                .unwrap();
        }

        assert_eq!(h.store.len(), 3);
    }

    #[tokio::test]
    async fn test_same_fare_twice_in_one_statement_is_kept() {
        let h = harness(100).await;
        let content = b"Date,Amount,Description\n\
            2024-03-01,-2.80,TFL TRAVEL CHARGE\n\
            2024-03-01,-2.80,TFL TRAVEL CHARGE\n";

        let report = h
            .service
            .upload(HIGH_STREET, USER, content, CancellationToken::new())
            .await
            .unwrap();

        assert!(report.row_errors.is_empty());
        assert_eq!(report.parsed, 2);
        assert_eq!(report.persisted, 2);
        assert_eq!(h.store.len(), 2);

        let reupload = h
            .service
            .upload(HIGH_STREET, USER, content, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(reupload.persisted, 0);
        assert_eq!(h.store.len(), 2);
    }

    fn generated_statement(rows: usize) -> Vec<u8> {
        let mut content = String::from("Date,Amount,Description,Reference\n");
        for i in 0..rows {
            let amount = if i % 9 == 4 { "n/a".to_string() } else { format!("-{}.00", i + 1) };
            let date = if i % 13 == 6 { "31/02/2024" } else { "2024-03-10" };
            content.push_str(&format!("{},{},Shop {},g{}\n", date, amount, i, i));
        }
        content.into_bytes()
    }

    #[tokio::test]
    async fn test_row_errors_do_not_depend_on_chunk_size() {
        let content = generated_statement(250);

        let by_hundred = harness(100)
            .await
            .service
            .upload(HIGH_STREET, USER, &content, CancellationToken::new())
            .await
            .unwrap();
        let by_fifty = harness(50)
            .await
            .service
            .upload(HIGH_STREET, USER, &content, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(by_hundred.row_errors, by_fifty.row_errors);
        assert_eq!(by_hundred.persisted, 250);
        assert_eq!(by_fifty.persisted, 250);
        // Data index 4 is file line 6.
        assert_eq!(by_hundred.row_errors[&6], vec!["invalid amount format: n/a".to_string()]);
        // Data index 6 is file line 8.
        assert_eq!(
            by_hundred.row_errors[&8],
            vec!["unknown date format: 31/02/2024".to_string()]
        );
    }

    #[tokio::test]
    async fn test_cancelled_upload_is_rejected() {
        let h = harness(100).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = h
            .service
            .upload(HIGH_STREET, USER, &generated_statement(10), cancel)
            .await;

        assert_eq!(result, Err(UploadError::Cancelled));
        assert!(h.store.is_empty());
    }

    #[rstest]
    #[case::unknown_bank(99, &b"Date,Amount\n"[..], UploadError::UnknownBank { bank_id: 99 })]
    #[case::api_only_bank(
        MONZO,
        &b"Date,Amount\n"[..],
        UploadError::UnsupportedImportMethod {
            bank_id: MONZO,
            method: fin_aggregator::types::ImportMethod::Csv
        }
    )]
    #[case::empty_file(HIGH_STREET, &b""[..], UploadError::EmptyContent)]
    #[case::missing_amount_header(
        HIGH_STREET,
        &b"Date,Description\n2024-03-01,x\n"[..],
        UploadError::MissingRequiredHeader { header: "Amount".to_string() }
    )]
    #[tokio::test]
    async fn test_fatal_errors_persist_nothing(
        #[case] bank: i64,
        #[case] content: &[u8],
        #[case] expected: UploadError,
    ) {
        let h = harness(100).await;
        let result = h
            .service
            .upload(bank, USER, content, CancellationToken::new())
            .await;

        assert_eq!(result, Err(expected));
        assert!(h.store.is_empty());
    }
}
