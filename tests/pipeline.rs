use bigdecimal::BigDecimal;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rust_xlsxwriter::Workbook;
use sales_report_rust::config::ReportConfig;
use sales_report_rust::{ReportError, ReportService, Upload};
use std::io::{Cursor, Read};
use std::str::FromStr;
use zip::ZipArchive;

fn xlsx_upload(headers: &[&str], rows: &[(&str, &str, f64)]) -> Upload {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, h) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *h).unwrap();
    }
    for (idx, (s, p, v)) in rows.iter().enumerate() {
        let r = idx as u32 + 1;
        sheet.write_string(r, 0, *s).unwrap();
        sheet.write_string(r, 1, *p).unwrap();
        sheet.write_number(r, 2, *v).unwrap();
    }
    Upload::new("vendas.xlsx", workbook.save_to_buffer().unwrap())
}

fn sales_upload(rows: &[(&str, &str, f64)]) -> Upload {
    xlsx_upload(&["Vendedor", "Produto", "Vendas"], rows)
}

fn archive_names(bytes: &[u8]) -> Vec<String> {
    let archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

fn archive_entry(bytes: &[u8], name: &str) -> Vec<u8> {
    let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut buf = Vec::new();
    entry.read_to_end(&mut buf).unwrap();
    buf
}

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

fn service() -> ReportService {
    ReportService::new(ReportConfig::default())
}

#[test]
fn two_salespeople_end_to_end() {
    let output = service()
        .generate_reports(&sales_upload(&[
            ("João", "Caneta", 150.50),
            ("Maria", "Caderno", 320.00),
        ]))
        .unwrap();

    assert_eq!(output.summary.get("João"), Some(&dec("150.50")));
    assert_eq!(output.summary.get("Maria"), Some(&dec("320.00")));
    assert_eq!(
        archive_names(&output.archive),
        vec!["João.xlsx", "Maria.xlsx", "planilha_resumo.xlsx"]
    );
    assert_eq!(
        output.archive_members,
        vec!["João.xlsx", "Maria.xlsx", "planilha_resumo.xlsx"]
    );
    assert!(output.pdf.starts_with(b"%PDF"));

    let consolidated = archive_entry(&output.archive, "planilha_resumo.xlsx");
    let mut wb = open_workbook_auto_from_rs(Cursor::new(consolidated)).unwrap();
    assert_eq!(wb.sheet_names(), vec!["Resumo", "Gráficos", "João", "Maria"]);
    let resumo = wb.worksheet_range("Resumo").unwrap();
    assert_eq!(resumo.get_value((2, 0)), Some(&Data::String("Maria".into())));
    assert_eq!(resumo.get_value((2, 1)), Some(&Data::Float(320.0)));
}

#[test]
fn same_salesperson_lands_in_one_file() {
    let output = service()
        .generate_reports(&sales_upload(&[("Ana", "X", 10.0), ("Ana", "Y", 15.0)]))
        .unwrap();

    assert_eq!(output.summary.len(), 1);
    assert_eq!(output.summary.get("Ana"), Some(&dec("25")));
    assert_eq!(
        archive_names(&output.archive),
        vec!["Ana.xlsx", "planilha_resumo.xlsx"]
    );

    let ana = archive_entry(&output.archive, "Ana.xlsx");
    let mut wb = open_workbook_auto_from_rs(Cursor::new(ana)).unwrap();
    let range = wb.worksheet_range_at(0).unwrap().unwrap();
    let products: Vec<_> = range.rows().skip(1).map(|r| r[1].to_string()).collect();
    assert_eq!(products, vec!["X", "Y"]);
}

#[test]
fn split_files_partition_the_input() {
    let rows = [
        ("A", "p", 1.0),
        ("B", "q", 2.0),
        ("A", "r", 3.0),
        ("C", "p", 4.0),
        ("B", "s", 5.0),
        ("A", "t", 6.0),
    ];
    let output = service().generate_reports(&sales_upload(&rows)).unwrap();

    let mut seen = Vec::new();
    for name in ["A.xlsx", "B.xlsx", "C.xlsx"] {
        let bytes = archive_entry(&output.archive, name);
        let mut wb = open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();
        let range = wb.worksheet_range_at(0).unwrap().unwrap();
        for row in range.rows().skip(1) {
            assert_eq!(format!("{}.xlsx", row[0]), name);
            seen.push((row[0].to_string(), row[1].to_string()));
        }
    }
    seen.sort();
    let mut expected: Vec<_> = rows
        .iter()
        .map(|(s, p, _)| (s.to_string(), p.to_string()))
        .collect();
    expected.sort();
    assert_eq!(seen, expected);
    assert_eq!(output.summary.total(), dec("21"));
}

#[test]
fn empty_table_yields_only_the_consolidated_workbook() {
    let output = service().generate_reports(&sales_upload(&[])).unwrap();
    assert!(output.summary.is_empty());
    assert_eq!(archive_names(&output.archive), vec!["planilha_resumo.xlsx"]);
    assert!(output.pdf.starts_with(b"%PDF"));
}

#[test]
fn missing_columns_are_named() {
    let err = service()
        .generate_reports(&xlsx_upload(&["Vendedor", "Item", "Total"], &[("Ana", "X", 1.0)]))
        .unwrap_err();
    match err {
        ReportError::Schema { missing } => assert_eq!(missing, vec!["Produto", "Vendas"]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn extra_columns_pass_through() {
    let upload = Upload::new(
        "vendas.csv",
        b"Data,Vendedor,Produto,Vendas\n2024-01-02,Ana,X,10\n2024-01-03,Bia,Y,5.5\n".to_vec(),
    );
    let output = service().generate_reports(&upload).unwrap();
    assert_eq!(output.summary.get("Bia"), Some(&dec("5.5")));

    let ana = archive_entry(&output.archive, "Ana.xlsx");
    let mut wb = open_workbook_auto_from_rs(Cursor::new(ana)).unwrap();
    let range = wb.worksheet_range_at(0).unwrap().unwrap();
    assert_eq!(range.get_value((0, 0)), Some(&Data::String("Data".into())));
    assert_eq!(range.get_value((1, 0)), Some(&Data::String("2024-01-02".into())));
    assert_eq!(range.get_value((1, 3)), Some(&Data::Float(10.0)));
}

#[test]
fn non_numeric_amount_is_reported() {
    let upload = Upload::new(
        "vendas.csv",
        b"Vendedor,Produto,Vendas\nAna,X,dez\n".to_vec(),
    );
    let err = service().generate_reports(&upload).unwrap_err();
    assert!(err.is_user_error());
    assert!(matches!(err, ReportError::Conversion { row: 2, .. }));
}

#[test]
fn reruns_are_equivalent() {
    let upload = sales_upload(&[
        ("Zé", "X", 0.1),
        ("Ana", "Y", 0.2),
        ("Zé", "Z", 0.3),
    ]);
    let first = service().generate_reports(&upload).unwrap();
    let second = service().generate_reports(&upload).unwrap();

    assert_eq!(first.summary, second.summary);
    assert_eq!(first.archive_members, second.archive_members);
    assert_eq!(first.summary.get("Zé"), Some(&dec("0.4")));
}
