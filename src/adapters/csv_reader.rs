use crate::domain::model::{QuestionColumn, SurveyFile, METADATA_COLUMNS};
use crate::utils::error::{ReportError, Result};
use std::io::Read;

/// 讀取問卷匯出的 CSV。
///
/// 前三欄是中繼資料，其餘每欄標題就是題目；每列是一位受訪者。
/// 欄數不足的列視為空白回答。
pub fn parse_survey<R: Read>(reader: R) -> Result<SurveyFile> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.len() <= METADATA_COLUMNS {
        return Err(ReportError::NoQuestionsError {
            message: format!(
                "found {} columns, expected at least {}",
                headers.len(),
                METADATA_COLUMNS + 1
            ),
        });
    }

    let metadata_headers = headers
        .iter()
        .take(METADATA_COLUMNS)
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut questions: Vec<QuestionColumn> = headers
        .iter()
        .skip(METADATA_COLUMNS)
        .map(|h| QuestionColumn {
            question: h.to_string(),
            responses: Vec::new(),
        })
        .collect();

    let mut respondent_count = 0;
    for record in rdr.records() {
        let record = record?;
        respondent_count += 1;
        for (offset, column) in questions.iter_mut().enumerate() {
            let cell = record.get(METADATA_COLUMNS + offset).unwrap_or("");
            column.responses.push(cell.to_string());
        }
    }

    tracing::debug!(
        "Parsed survey with {} respondents and {} questions",
        respondent_count,
        questions.len()
    );

    Ok(SurveyFile {
        metadata_headers,
        questions,
        respondent_count,
    })
}
