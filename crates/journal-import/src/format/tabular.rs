//! 구분자 기반 표 읽기 (csv 크레이트).

use csv::{ReaderBuilder, StringRecord, Trim};

use super::{strip_bom, SkippedRecord};
use crate::error::ImportError;

/// 헤더 + 데이터 행.
#[derive(Debug)]
pub(crate) struct Table {
    headers: Vec<String>,
    pub rows: Vec<Row>,
    /// 읽기 자체가 실패한 행
    pub unreadable: Vec<SkippedRecord>,
}

#[derive(Debug)]
pub(crate) struct Row {
    pub line: usize,
    record: StringRecord,
}

impl Table {
    pub fn read(text: &str, delimiter: u8) -> Result<Self, ImportError> {
        let text = strip_bom(text).trim_start();
        if text.trim().is_empty() {
            return Err(ImportError::EmptyPayload);
        }

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()?
            .iter()
            .map(normalize_header)
            .collect();

        let mut rows = Vec::new();
        let mut unreadable = Vec::new();

        for (index, result) in reader.records().enumerate() {
            match result {
                Ok(record) => {
                    if record.iter().all(|field| field.is_empty()) {
                        continue;
                    }
                    let line = record
                        .position()
                        .map_or(index + 2, |pos| pos.line() as usize);
                    rows.push(Row { line, record });
                }
                Err(e) => {
                    let line = e.position().map_or(index + 2, |pos| pos.line() as usize);
                    unreadable.push(SkippedRecord::new(line, format!("unreadable row: {e}")));
                }
            }
        }

        Ok(Self {
            headers,
            rows,
            unreadable,
        })
    }

    /// 후보 이름 중 처음 존재하는 컬럼 인덱스. 비교는 대소문자/공백 무시.
    pub fn column(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|name| {
            let wanted = normalize_header(name);
            self.headers.iter().position(|h| *h == wanted)
        })
    }

    pub fn has_column(&self, names: &[&str]) -> bool {
        self.column(names).is_some()
    }
}

impl Row {
    /// 비어 있지 않은 필드 값.
    pub fn get(&self, column: Option<usize>) -> Option<&str> {
        column
            .and_then(|i| self.record.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// 필수 필드. 없으면 누락 사유 문자열.
    pub fn require(&self, column: Option<usize>, name: &str) -> Result<&str, String> {
        self.get(column)
            .ok_or_else(|| format!("missing {name}"))
    }

    /// 원본 행을 헤더 이름과 함께 JSON 객체로.
    pub fn to_json(&self, table: &Table) -> serde_json::Value {
        let map = table
            .headers
            .iter()
            .zip(self.record.iter())
            .map(|(h, v)| (h.clone(), serde_json::Value::String(v.to_string())))
            .collect();
        serde_json::Value::Object(map)
    }
}

fn normalize_header(name: &str) -> String {
    name.trim()
        .trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_semicolon_table() {
        let text = "Instrumento ; Acción;Cantidad\nNQ 03-25; Comprar ;1\n\n;;\nES 03-25;Vender;2\n";
        let table = Table::read(text, b';').unwrap();

        assert_eq!(table.rows.len(), 2);
        let col = table.column(&["Acción"]);
        assert_eq!(table.rows[0].get(col), Some("Comprar"));
        assert!(table.rows[1].line > table.rows[0].line);
        assert!(table.column(&["Missing"]).is_none());
    }

    #[test]
    fn test_quoted_fields_and_flexible_rows() {
        let text = "Product,P/L,Account\n\"NQ\",\"$1,250.00\"\nES,\"$(50.00)\",A1\n";
        let table = Table::read(text, b',').unwrap();

        let pnl = table.column(&["P/L"]);
        let account = table.column(&["Account"]);
        assert_eq!(table.rows[0].get(pnl), Some("$1,250.00"));
        assert_eq!(table.rows[0].get(account), None);
        assert_eq!(table.rows[1].get(account), Some("A1"));
    }

    #[test]
    fn test_empty_payload() {
        assert!(matches!(Table::read("  \n", b','), Err(ImportError::EmptyPayload)));
    }

    #[test]
    fn test_require_reports_name() {
        let table = Table::read("a,b\n1,\n", b',').unwrap();
        let row = &table.rows[0];
        assert_eq!(row.require(table.column(&["a"]), "a"), Ok("1"));
        assert_eq!(
            row.require(table.column(&["b"]), "b"),
            Err("missing b".to_string())
        );
    }
}
