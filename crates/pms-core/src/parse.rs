//! 업로드된 CSV의 디코딩 및 파싱.
//!
//! 바이트 페이로드를 텍스트로 디코딩하고 (BOM 제거, UTF-8 lossy 변환),
//! 구분자를 자동 감지한 뒤 헤더 기반의 행 맵으로 파싱합니다.
//! 이 단계는 스토리지를 전혀 건드리지 않습니다.

use std::collections::HashMap;

use csv::{ReaderBuilder, Trim};

use crate::error::{SheetError, SheetResult};
use crate::schema::missing_columns;

/// 구분자 자동 감지 후보. 쉼표가 기본값입니다.
const DELIMITER_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

/// 헤더 이름으로 키가 매겨진 CSV 데이터 행 하나.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    /// 데이터 행 기준 1-base 위치 (헤더 제외, 공백 행 제외)
    pub index: usize,
    /// 트리밍된 헤더 이름 -> 트리밍된 원본 값
    pub values: HashMap<String, String>,
}

impl ParsedRow {
    /// 컬럼 값을 반환합니다. 없는 컬럼은 빈 문자열로 취급합니다.
    pub fn get(&self, column: &str) -> &str {
        self.values.get(column).map(String::as_str).unwrap_or("")
    }
}

/// 파싱이 끝난 시트: 발견된 헤더와 데이터 행 목록.
#[derive(Debug, Clone)]
pub struct ParsedSheet {
    pub headers: Vec<String>,
    pub rows: Vec<ParsedRow>,
}

/// 업로드 바이트를 텍스트로 디코딩합니다.
///
/// UTF-8 BOM(EF BB BF)은 바이트 수준에서 제거하고, 유효하지 않은 UTF-8은
/// lossy 변환으로 수용합니다. 업로드 파일 인코딩 문제로 요청을 거부하지 않습니다.
pub fn decode_csv_bytes(bytes: &[u8]) -> String {
    let without_bom = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    String::from_utf8_lossy(without_bom).into_owned()
}

/// 헤더 이름에서 BOM 잔재를 제거하고 트리밍합니다.
///
/// 원시 `\u{FEFF}` 코드포인트와 이중 디코딩된 3바이트 형태(`ï»¿`) 모두
/// 처리합니다. 후자는 내보내기 도구가 BOM을 Latin-1로 잘못 디코딩했을 때
/// 첫 헤더에 남는 형태입니다.
fn clean_header(raw: &str) -> String {
    let mut name = raw.trim();
    loop {
        if let Some(rest) = name.strip_prefix('\u{feff}') {
            name = rest;
        } else if let Some(rest) = name.strip_prefix("ï»¿") {
            name = rest;
        } else {
            break;
        }
    }
    name.trim().to_string()
}

/// 샘플 줄들에서 가장 일관되게 나타나는 구분자를 고릅니다.
///
/// 후보는 `, ; \t |` 네 가지이며, 어떤 후보도 나타나지 않으면 쉼표를
/// 반환합니다. 점수는 첫 줄 출현 횟수와 줄 간 일관성의 곱입니다.
pub fn detect_delimiter(text: &str) -> u8 {
    let lines: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(10)
        .collect();

    let mut best = b',';
    let mut best_score = 0usize;

    for candidate in DELIMITER_CANDIDATES {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| line.bytes().filter(|b| *b == candidate).count())
            .collect();
        let Some(&first_count) = counts.first() else {
            continue;
        };
        if first_count == 0 {
            continue;
        }
        let consistent = counts.iter().filter(|&&c| c == first_count).count();
        let score = first_count * consistent;
        if score > best_score {
            best_score = score;
            best = candidate;
        }
    }

    best
}

/// CSV 페이로드를 마스터 시트 행으로 파싱합니다.
///
/// # Returns
///
/// 성공 시 발견된 헤더와 데이터 행을 담은 [`ParsedSheet`]를 반환합니다.
///
/// # Errors
///
/// - [`SheetError::EmptyFile`]: 디코딩 결과가 공백뿐인 경우
/// - [`SheetError::NoDataRows`]: 헤더만 있고 데이터 행이 없는 경우
/// - [`SheetError::MissingColumns`]: 필수 컬럼이 헤더에 없는 경우
pub fn parse_master_sheet(bytes: &[u8]) -> SheetResult<ParsedSheet> {
    let text = decode_csv_bytes(bytes);
    if text.trim().is_empty() {
        return Err(SheetError::EmptyFile);
    }

    // 선행 공백 줄은 헤더 위치를 흔들지 않도록 먼저 걷어낸다
    let text = text.trim_start();
    let delimiter = detect_delimiter(text);

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(Trim::All)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(SheetError::from)?
        .iter()
        .map(clean_header)
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(SheetError::from)?;
        // 공백만 있는 줄은 단일 빈 필드 레코드로 들어온다
        if record.len() <= 1 && record.get(0).map(str::trim).unwrap_or("").is_empty() {
            continue;
        }
        let values: HashMap<String, String> = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let value = record.get(i).unwrap_or("").trim().to_string();
                (header.clone(), value)
            })
            .collect();
        rows.push(ParsedRow {
            index: rows.len() + 1,
            values,
        });
    }

    if rows.is_empty() {
        return Err(SheetError::NoDataRows);
    }

    let missing = missing_columns(&headers);
    if !missing.is_empty() {
        return Err(SheetError::MissingColumns {
            missing,
            column_names: headers,
        });
    }

    Ok(ParsedSheet { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::REQUIRED_COLUMNS;

    fn full_header(delimiter: char) -> String {
        REQUIRED_COLUMNS.join(&delimiter.to_string())
    }

    fn valid_row(delimiter: char) -> String {
        [
            "2024-01-02",
            "1000000",
            "0",
            "100.5",
            "100.0",
            "5000",
            "0.5%",
            "900000",
            "995000",
            "890000",
            "4500",
            "-2.1%",
            "SPSAR",
        ]
        .join(&delimiter.to_string())
    }

    #[test]
    fn test_parse_simple_sheet() {
        let content = format!("{}\n{}\n", full_header(','), valid_row(','));
        let sheet = parse_master_sheet(content.as_bytes()).unwrap();

        assert_eq!(sheet.headers.len(), 13);
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0].index, 1);
        assert_eq!(sheet.rows[0].get("Date"), "2024-01-02");
        assert_eq!(sheet.rows[0].get("System Tag"), "SPSAR");
        assert_eq!(sheet.rows[0].get("Daily P/L %"), "0.5%");
    }

    #[test]
    fn test_parse_strips_byte_level_bom() {
        let mut content = vec![0xEF, 0xBB, 0xBF];
        content.extend_from_slice(format!("{}\n{}", full_header(','), valid_row(',')).as_bytes());
        let sheet = parse_master_sheet(&content).unwrap();
        assert_eq!(sheet.headers[0], "Date");
    }

    #[test]
    fn test_parse_strips_misdecoded_bom_from_header() {
        let content = format!("ï»¿{}\n{}", full_header(','), valid_row(','));
        let sheet = parse_master_sheet(content.as_bytes()).unwrap();
        assert_eq!(sheet.headers[0], "Date");
    }

    #[test]
    fn test_parse_detects_semicolon_delimiter() {
        let content = format!("{}\n{}", full_header(';'), valid_row(';'));
        let sheet = parse_master_sheet(content.as_bytes()).unwrap();
        assert_eq!(sheet.headers.len(), 13);
        assert_eq!(sheet.rows[0].get("System Tag"), "SPSAR");
    }

    #[test]
    fn test_detect_delimiter_defaults_to_comma() {
        assert_eq!(detect_delimiter("single column header\nvalue"), b',');
        assert_eq!(detect_delimiter(""), b',');
    }

    #[test]
    fn test_detect_delimiter_tab_and_pipe() {
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), b'\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), b'|');
    }

    #[test]
    fn test_parse_empty_file() {
        assert!(matches!(
            parse_master_sheet(b""),
            Err(SheetError::EmptyFile)
        ));
        assert!(matches!(
            parse_master_sheet(b"   \n  \n"),
            Err(SheetError::EmptyFile)
        ));
    }

    #[test]
    fn test_parse_header_only_file() {
        let content = format!("{}\n", full_header(','));
        assert!(matches!(
            parse_master_sheet(content.as_bytes()),
            Err(SheetError::NoDataRows)
        ));
    }

    #[test]
    fn test_parse_missing_columns() {
        let content = "Date,Portfolio Value\n2024-01-02,1000\n";
        let err = parse_master_sheet(content.as_bytes()).unwrap_err();
        match err {
            SheetError::MissingColumns {
                missing,
                column_names,
            } => {
                assert!(missing.contains(&"System Tag".to_string()));
                assert!(!missing.contains(&"Date".to_string()));
                assert_eq!(column_names, vec!["Date", "Portfolio Value"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_column_check_runs_after_data_row_check() {
        // 헤더가 불완전해도 데이터 행이 없으면 NoDataRows가 우선
        let content = "Date,Portfolio Value\n";
        assert!(matches!(
            parse_master_sheet(content.as_bytes()),
            Err(SheetError::NoDataRows)
        ));
    }

    #[test]
    fn test_parse_skips_blank_lines_and_keeps_row_index() {
        let content = format!(
            "{}\n\n{}\n   \n{}\n",
            full_header(','),
            valid_row(','),
            valid_row(',')
        );
        let sheet = parse_master_sheet(content.as_bytes()).unwrap();
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].index, 1);
        assert_eq!(sheet.rows[1].index, 2);
    }

    #[test]
    fn test_parse_short_row_fills_empty_values() {
        let content = format!("{}\n2024-01-02,1000\n", full_header(','));
        let sheet = parse_master_sheet(content.as_bytes()).unwrap();
        assert_eq!(sheet.rows[0].get("Date"), "2024-01-02");
        assert_eq!(sheet.rows[0].get("Portfolio Value"), "1000");
        assert_eq!(sheet.rows[0].get("System Tag"), "");
    }

    #[test]
    fn test_parse_quoted_field_with_delimiter() {
        let mut row_values = vec!["2024-01-02"; 1];
        row_values.push("\"1,000,000\"");
        let mut rest = vec!["0"; 10];
        rest.push("SPSAR");
        row_values.extend(rest);
        let content = format!("{}\n{}\n", full_header(','), row_values.join(","));

        let sheet = parse_master_sheet(content.as_bytes()).unwrap();
        assert_eq!(sheet.rows[0].get("Portfolio Value"), "1,000,000");
    }

    #[test]
    fn test_parse_trims_cell_whitespace() {
        let content = format!(
            "{}\n 2024-01-02 ,1000,0,1,1,1,1,1,1,1,1,1,  SPSAR \n",
            full_header(',')
        );
        let sheet = parse_master_sheet(content.as_bytes()).unwrap();
        assert_eq!(sheet.rows[0].get("Date"), "2024-01-02");
        assert_eq!(sheet.rows[0].get("System Tag"), "SPSAR");
    }
}
