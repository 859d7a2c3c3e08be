use std::collections::BTreeMap;

use chrono::NaiveDate;
use quiz_core::model::{
    AskedLog, Question, QuestionBank, QuestionId, WeeklyScores, WrongEntry, WrongLog,
};
use serde::{Deserialize, Serialize};

use crate::repository::StorageError;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn invalid<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::InvalidRecord(e.to_string())
}

/// On-disk shape of a question (field names are part of the file format).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct QuestionRecord {
    pub id: QuestionId,
    #[serde(rename = "soru")]
    pub prompt: String,
    #[serde(rename = "secenekler")]
    pub choices: Vec<String>,
    #[serde(rename = "dogru")]
    pub answer: String,
}

/// On-disk shape of a wrong-log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WrongRecord {
    pub id: QuestionId,
    pub date: String,
}

pub(crate) type ScoreRecords = BTreeMap<String, u32>;

pub(crate) fn bank_from_records(records: Vec<QuestionRecord>) -> Result<QuestionBank, StorageError> {
    let questions = records
        .into_iter()
        .map(|r| Question::new(r.id, r.prompt, r.choices, r.answer).map_err(invalid))
        .collect::<Result<Vec<_>, _>>()?;
    QuestionBank::new(questions).map_err(invalid)
}

pub(crate) fn bank_to_records(bank: &QuestionBank) -> Vec<QuestionRecord> {
    bank.iter()
        .map(|q| QuestionRecord {
            id: q.id().clone(),
            prompt: q.prompt().to_owned(),
            choices: q.choices().to_vec(),
            answer: q.answer().to_owned(),
        })
        .collect()
}

pub(crate) fn asked_from_records(ids: Vec<QuestionId>) -> AskedLog {
    AskedLog::from_persisted(ids)
}

pub(crate) fn asked_to_records(log: &AskedLog) -> Vec<QuestionId> {
    log.ids().to_vec()
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, StorageError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| StorageError::InvalidRecord(format!("date {raw:?}: {e}")))
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn scores_from_records(records: ScoreRecords) -> Result<WeeklyScores, StorageError> {
    let days = records
        .into_iter()
        .map(|(date, count)| parse_date(&date).map(|d| (d, count)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(WeeklyScores::from_persisted(days))
}

pub(crate) fn scores_to_records(scores: &WeeklyScores) -> ScoreRecords {
    scores
        .iter()
        .map(|(date, count)| (format_date(date), count))
        .collect()
}

pub(crate) fn wrong_from_records(records: Vec<WrongRecord>) -> Result<WrongLog, StorageError> {
    let entries = records
        .into_iter()
        .map(|r| {
            parse_date(&r.date).map(|date| WrongEntry { id: r.id, date })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(WrongLog::from_persisted(entries))
}

pub(crate) fn wrong_to_records(log: &WrongLog) -> Vec<WrongRecord> {
    log.entries()
        .iter()
        .map(|e| WrongRecord {
            id: e.id.clone(),
            date: format_date(e.date),
        })
        .collect()
}
