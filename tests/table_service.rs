use capbudg_tables::server;
use capbudg_tables::server::AppState;
use capbudg_tables::spreadsheet::CellValue;
use capbudg_tables::spreadsheet::Grid;
use capbudg_tables::spreadsheet::Number;
use capbudg_tables::table::builtin_layouts;
use capbudg_tables::table::QueryError;
use capbudg_tables::table::Range;
use capbudg_tables::TableRegistry;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::net::TcpStream;

const DISCOUNT_RATE_LABELS: [&str; 8] = [
    "Approach(1:Direct;2:CAPM)=",
    "1. Discount rate =",
    "2a. Beta",
    " b. Riskless rate=",
    " c. Market risk premium =",
    " d. Debt Ratio =",
    " e. Cost of Borrowing =",
    "Discount rate used=",
];

/// Places `value` at an A1 reference, growing the rows as needed.
fn place(rows: &mut Vec<Vec<CellValue>>, reference: &str, value: CellValue) {
    let ((row, col), _) = Range::try_from(reference).unwrap().corners().unwrap();
    if rows.len() <= row {
        rows.resize(row + 1, Vec::new());
    }
    if rows[row].len() <= col {
        rows[row].resize(col + 1, CellValue::Empty);
    }
    rows[row][col] = value;
}

/// A worksheet shaped like the capital budgeting workbook.
fn workbook() -> Grid {
    let mut rows = Vec::new();
    let mut put = |reference: &str, value: CellValue| place(&mut rows, reference, value);

    put("A4", "Initial Investment=".into());
    put("C4", 50000.0f64.into());
    put("A5", "Opportunity cost (if any)=".into());
    put("C5", 0.0f64.into());
    put("A6", "Lifetime of the investment".into());
    put("C6", 10.0f64.into());
    put("A7", "Salvage Value at end of project=".into());
    put("C7", 10000.0f64.into());
    put("A8", "Deprec. method(1:St.line;2:DDB)=".into());
    put("C8", 1.0f64.into());
    put("A9", "Tax Credit (if any )=".into());
    put("C9", 0.1f64.into());
    put("A10", "Other invest.(non-depreciable)=".into());
    put("C10", 0.0f64.into());

    for (index, label) in DISCOUNT_RATE_LABELS.iter().enumerate() {
        put(&format!("I{}", index + 4), (*label).into());
        put(&format!("K{}", index + 4), 0.1f64.into());
    }

    put("A38", "Revenues".into());
    put("A39", "-Var. Expenses".into());
    for (col, year) in ["C", "D", "E", "F", "G", "H", "I", "J", "K", "L"].iter().zip(1..) {
        put(&format!("{}37", col), CellValue::from(year as i64));
        put(&format!("{}38", col), CellValue::from(1000.0 * year as f64));
        put(&format!("{}39", col), CellValue::from(-500.0));
    }
    put("C40", "n/a".into());
    put("A40", "Revenues".into());

    Grid::from_rows(rows)
}

fn registry() -> TableRegistry {
    TableRegistry::build(&workbook(), &builtin_layouts()).unwrap()
}

#[test]
fn lists_the_nine_tables_in_order() {
    assert_eq!(
        registry().list_tables(),
        vec![
            "INITIAL INVESTMENT",
            "CASHFLOW DETAILS",
            "DISCOUNT RATE",
            "WORKING CAPITAL",
            "INITIAL INVESTMENT Details",
            "Investment Measures",
            "GROWTH RATES",
            "SALVAGE VALUE",
            "OPERATING CASHFLOWS",
        ]
    );
}

#[test]
fn describes_discount_rate() {
    let details = registry().describe_table("DISCOUNT RATE").unwrap();
    assert_eq!(details.table_name, "DISCOUNT RATE");
    assert_eq!(details.row_names, DISCOUNT_RATE_LABELS);
}

#[test]
fn sums_initial_investment() {
    let registry = registry();
    let sum = registry.sum_row("INITIAL INVESTMENT", "Initial Investment=").unwrap();
    assert_eq!(sum.sum, Number::Int(50000));
    assert_eq!(registry.sum_row("INITIAL INVESTMENT", "Initial Investment=").unwrap(), sum);
    assert_eq!(
        registry.sum_row("INITIAL INVESTMENT", "Tax Credit (if any )=").unwrap().sum,
        Number::Float(0.1)
    );
}

#[test]
fn sums_first_of_duplicate_rows() {
    // Column B is dropped, C..L hold ten years.
    let sum = registry().sum_row("OPERATING CASHFLOWS", "Revenues").unwrap();
    assert_eq!(sum.sum, Number::Int(55000));
    let expenses = registry().sum_row("OPERATING CASHFLOWS", "-Var. Expenses").unwrap();
    assert_eq!(expenses.sum, Number::Int(-5000));
}

#[test]
fn query_failures() {
    let registry = registry();
    assert_eq!(
        registry.describe_table("CAPEX"),
        Err(QueryError::InvalidTableName("CAPEX".to_owned()))
    );
    assert!(matches!(
        registry.sum_row("DISCOUNT RATE", "Beta"),
        Err(QueryError::InvalidRowName { .. })
    ));
    assert!(matches!(
        registry.sum_row("WORKING CAPITAL", ""),
        Err(QueryError::NonNumericRowData { .. })
    ));
}

async fn get(address: &str, path: &str) -> (u16, serde_json::Value) {
    let mut stream = TcpStream::connect(address).await.unwrap();
    let request = format!("GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n", path, address);
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    let (head, body) = response.split_once("\r\n\r\n").unwrap();
    let status = head.split_whitespace().nth(1).unwrap().parse().unwrap();
    (status, serde_json::from_str(body).unwrap())
}

#[tokio::test]
async fn serves_over_http() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let app = server::router(AppState::new(registry()));
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    let (status, body) = get(&address, "/").await;
    assert_eq!(status, 200);
    assert_eq!(body["Project Name"], "Capital Budgeting Excel Processor");

    let (status, body) = get(&address, "/list_tables").await;
    assert_eq!(status, 200);
    assert_eq!(body["tables"].as_array().unwrap().len(), 9);

    let (status, body) = get(&address, "/get_table_details/DISCOUNT%20RATE").await;
    assert_eq!(status, 200);
    assert_eq!(body["row_names"][2], "2a. Beta");

    let (status, body) = get(&address, "/row_sum/INITIAL%20INVESTMENT/Initial%20Investment=").await;
    assert_eq!(status, 200);
    assert_eq!(
        body,
        serde_json::json!({
            "table_name": "INITIAL INVESTMENT",
            "row_name": "Initial Investment=",
            "sum": 50000
        })
    );

    let (status, body) = get(&address, "/get_table_details/CAPEX").await;
    assert_eq!(status, 404);
    assert_eq!(body, serde_json::json!({"Invalid Table Name": "No table with name <CAPEX> found."}));

    let (status, body) = get(&address, "/row_sum/DISCOUNT%20RATE/Beta").await;
    assert_eq!(status, 404);
    assert_eq!(
        body,
        serde_json::json!({"Invalid Row Name": "No row with name <Beta> found in table <DISCOUNT RATE>."})
    );
}
