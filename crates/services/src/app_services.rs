use std::path::Path;
use std::sync::Arc;

use log::info;
use quiz_core::model::{Question, QuestionBank, QuestionId, QuizSettings};
use storage::Storage;
use storage::repository::QuestionRepository;

use crate::Clock;
use crate::error::AppServicesError;
use crate::sessions::{OverviewService, QuizLoopService};

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    settings: QuizSettings,
    storage: Storage,
    quiz_loop: Arc<QuizLoopService>,
    overview: Arc<OverviewService>,
}

impl AppServices {
    /// Build services backed by JSON documents in `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the directory or an existing document cannot be used.
    pub async fn new_json(
        data_dir: impl AsRef<Path>,
        clock: Clock,
        settings: QuizSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::json_files(data_dir).await?;
        Ok(Self::from_storage(storage, clock, settings))
    }

    #[must_use]
    pub fn from_storage(storage: Storage, clock: Clock, settings: QuizSettings) -> Self {
        let quiz_loop = Arc::new(QuizLoopService::from_storage(clock, settings, &storage));
        let overview = Arc::new(OverviewService::from_storage(
            clock,
            settings.utc_offset(),
            &storage,
        ));
        Self {
            settings,
            storage,
            quiz_loop,
            overview,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }

    #[must_use]
    pub fn overview(&self) -> Arc<OverviewService> {
        Arc::clone(&self.overview)
    }

    /// Write the sample bank when the current bank is empty.
    ///
    /// Returns `true` if questions were written.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the bank cannot be read or written.
    pub async fn seed_sample_bank(&self) -> Result<bool, AppServicesError> {
        seed_if_empty(self.storage.questions.as_ref()).await
    }
}

async fn seed_if_empty(questions: &dyn QuestionRepository) -> Result<bool, AppServicesError> {
    if !questions.load_questions().await?.is_empty() {
        return Ok(false);
    }

    let bank = sample_bank()?;
    questions.save_questions(&bank).await?;
    info!("seeded question bank with {} questions", bank.len());
    Ok(true)
}

/// A small anatomy/physiology starter bank.
///
/// # Errors
///
/// Returns `AppServicesError::Question` if a sample entry is malformed.
pub fn sample_bank() -> Result<QuestionBank, AppServicesError> {
    const SAMPLES: &[(&str, &[&str], &str)] = &[
        ("Vücudun en uzun kemiği hangisidir?", &["Femur", "Tibia", "Humerus", "Fibula"], "Femur"),
        ("Kalp kaç odacıktan oluşur?", &["2", "3", "4", "5"], "4"),
        ("İnsülin hangi hücrelerden salgılanır?", &["Alfa", "Beta", "Delta", "PP"], "Beta"),
        ("Kırmızı kan hücrelerinin ömrü yaklaşık kaç gündür?", &["30", "60", "120", "365"], "120"),
        ("Hangi vitamin eksikliği skorbüt yapar?", &["A", "B12", "C", "D"], "C"),
        ("Yetişkinde kaç adet kalıcı diş bulunur?", &["28", "30", "32", "34"], "32"),
        ("Safra nerede depolanır?", &["Karaciğer", "Safra kesesi", "Pankreas", "Dalak"], "Safra kesesi"),
        ("Diyafram hangi sinir tarafından uyarılır?", &["Vagus", "Frenik", "Aksiller", "Radial"], "Frenik"),
        ("Normal vücut sıcaklığı yaklaşık kaç derecedir?", &["35", "36.5", "37", "38"], "37"),
        ("Hemoglobinde bulunan metal hangisidir?", &["Bakır", "Çinko", "Demir", "Magnezyum"], "Demir"),
    ];

    let questions = SAMPLES
        .iter()
        .zip(1_i64..)
        .map(|((prompt, choices, answer), id)| {
            Question::new(
                QuestionId::new(id),
                *prompt,
                choices.iter().map(|c| (*c).to_string()).collect(),
                *answer,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(QuestionBank::new(questions)?)
}
