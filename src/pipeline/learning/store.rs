//! Persistent learned-pattern store.
//!
//! One SQLite connection behind a mutex: every caller, job workers and
//! feedback alike, is serialized, and each multi-row write runs in a
//! transaction so no (token, category) update is lost.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Transaction};

use super::signals::{content_signals, filename_tokens};
use super::*;
use crate::db;
use crate::pipeline::categories::is_fallback;

pub struct PatternStore {
    conn: Mutex<Connection>,
}

impl PatternStore {
    /// Open (and migrate) the store at `path`.
    pub fn open(path: &Path) -> Result<Self, PatternStoreError> {
        Ok(Self::from_connection(db::open_database(path)?))
    }

    /// Isolated in-memory store.
    pub fn in_memory() -> Result<Self, PatternStoreError> {
        Ok(Self::from_connection(db::open_memory_database()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, PatternStoreError> {
        self.conn.lock().map_err(|_| PatternStoreError::StorageUnavailable)
    }

    // ═══════════════════════════════════════════════════════════
    // Suggestion
    // ═══════════════════════════════════════════════════════════

    /// Best learned category for this file, or `None` when no stored
    /// pattern matches.
    pub fn suggest(&self, filename: &str, text: &str) -> Result<Option<LearnedSuggestion>, PatternStoreError> {
        let conn = self.lock()?;
        // (category, score, matched patterns) in first-seen order
        let mut scores: Vec<(String, f64, usize)> = Vec::new();

        {
            let mut stmt = conn.prepare_cached(
                "SELECT category, confidence, usage_count FROM learned_patterns
                 WHERE pattern_type = 'filename' AND pattern_value = ?1
                 ORDER BY confidence DESC, usage_count DESC, category ASC",
            )?;
            for token in filename_tokens(filename) {
                let rows = stmt.query_map(params![token], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?, row.get::<_, i64>(2)?))
                })?;
                for row in rows {
                    let (category, confidence, usage) = row?;
                    accumulate(&mut scores, category, pattern_score(confidence, usage));
                }
            }
        }

        if !text.trim().is_empty() {
            let categories: Vec<String> = {
                let mut stmt = conn.prepare_cached("SELECT DISTINCT category FROM learned_patterns ORDER BY category")?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                rows.collect::<Result<_, _>>()?
            };

            let mut stmt = conn.prepare_cached(
                "SELECT confidence, usage_count FROM learned_patterns
                 WHERE pattern_type = 'content' AND pattern_value = ?1 AND category = ?2",
            )?;
            for category in categories {
                for signal in content_signals(text, &category) {
                    let found = stmt
                        .query_row(params![signal, category], |row| {
                            Ok((row.get::<_, f64>(0)?, row.get::<_, i64>(1)?))
                        })
                        .optional()?;
                    if let Some((confidence, usage)) = found {
                        accumulate(&mut scores, category.clone(), pattern_score(confidence, usage) * CONTENT_WEIGHT);
                    }
                }
            }
        }

        let mut best: Option<&(String, f64, usize)> = None;
        for entry in &scores {
            if best.map_or(true, |b| entry.1 > b.1) {
                best = Some(entry);
            }
        }

        Ok(best.map(|(category, raw, matched)| {
            let multiplier = (MATCH_MULTIPLIER_BASE + MATCH_MULTIPLIER_STEP * *matched as f64).min(1.0);
            LearnedSuggestion {
                category: category.clone(),
                confidence: (raw * multiplier).min(1.0),
                matched_patterns: *matched,
            }
        }))
    }

    // ═══════════════════════════════════════════════════════════
    // Feedback
    // ═══════════════════════════════════════════════════════════

    /// Reinforce every filename token for `category`: existing patterns
    /// gain confidence and usage, missing ones are created.
    pub fn reinforce_positive(&self, filename: &str, category: &str) -> Result<usize, PatternStoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = now();

        insert_feedback(&tx, filename, category, true, &now)?;

        let tokens = filename_tokens(filename);
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO learned_patterns (pattern_type, pattern_value, category, confidence, usage_count, last_used)
                 VALUES ('filename', ?1, ?2, ?3, 1, ?4)
                 ON CONFLICT (pattern_type, pattern_value, category) DO UPDATE SET
                    confidence = MIN(?5, confidence + ?6),
                    usage_count = usage_count + 1,
                    last_used = excluded.last_used",
            )?;
            for token in &tokens {
                stmt.execute(params![token, category, POSITIVE_INITIAL, now, MAX_PATTERN_CONFIDENCE, POSITIVE_STEP])?;
            }
        }

        tx.execute(
            "UPDATE performance_stats
             SET correct_classifications = correct_classifications + 1,
                 accuracy_rate = MIN(1.0, CAST(correct_classifications + 1 AS REAL) / MAX(total_classifications, 1)),
                 last_updated = ?2
             WHERE category = ?1",
            params![category, now],
        )?;

        tx.commit()?;
        tracing::info!(filename, category, patterns = tokens.len(), "Positive feedback recorded");
        Ok(tokens.len())
    }

    /// Penalize existing filename-token patterns for `category`.
    /// Returns how many patterns were lowered.
    pub fn reinforce_negative(&self, filename: &str, category: &str) -> Result<usize, PatternStoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = now();

        insert_feedback(&tx, filename, category, false, &now)?;

        let mut penalized = 0;
        {
            let mut stmt = tx.prepare_cached(
                "UPDATE learned_patterns SET confidence = MAX(?3, confidence - ?4)
                 WHERE pattern_type = 'filename' AND pattern_value = ?1 AND category = ?2",
            )?;
            for token in filename_tokens(filename) {
                penalized += stmt.execute(params![token, category, MIN_PATTERN_CONFIDENCE, NEGATIVE_STEP])?;
            }
        }

        tx.commit()?;
        tracing::info!(filename, category, penalized, "Negative feedback recorded");
        Ok(penalized)
    }

    // ═══════════════════════════════════════════════════════════
    // History
    // ═══════════════════════════════════════════════════════════

    /// Record a verdict. `confidence` is `None` for the fallback sentinel.
    /// Non-fallback verdicts also seed missing filename and content
    /// patterns at the learned initial confidence; existing rows are left alone.
    pub fn record_outcome(
        &self,
        filename: &str,
        category: &str,
        confidence: Option<f64>,
        text: &str,
    ) -> Result<(), PatternStoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = now();

        tx.execute(
            "INSERT INTO classification_history (filename, original_category, confidence, text_content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![filename, category, confidence, text, now],
        )?;
        tx.execute(
            "INSERT INTO performance_stats (category, total_classifications, last_updated)
             VALUES (?1, 1, ?2)
             ON CONFLICT (category) DO UPDATE SET
                total_classifications = total_classifications + 1,
                last_updated = excluded.last_updated",
            params![category, now],
        )?;

        if !is_fallback(category) {
            let mut stmt = tx.prepare_cached(
                "INSERT OR IGNORE INTO learned_patterns
                 (pattern_type, pattern_value, category, confidence, usage_count, last_used)
                 VALUES (?1, ?2, ?3, ?4, 1, ?5)",
            )?;
            for (kind, value) in observed_patterns(filename, text, category) {
                stmt.execute(params![kind.as_str(), value, category, LEARNED_INITIAL, now])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Apply a user correction to the latest history row for `filename`
    /// and learn from it. Returns the number of patterns touched, or
    /// `None` when the file has no history.
    pub fn record_correction(&self, filename: &str, corrected: &str) -> Result<Option<usize>, PatternStoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = now();

        let latest: Option<(i64, Option<String>)> = tx
            .query_row(
                "SELECT id, text_content FROM classification_history
                 WHERE filename = ?1 ORDER BY id DESC LIMIT 1",
                params![filename],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((id, text)) = latest else {
            return Ok(None);
        };

        tx.execute(
            "UPDATE classification_history SET corrected_category = ?2, feedback_given = 1 WHERE id = ?1",
            params![id, corrected],
        )?;

        let observed = observed_patterns(filename, text.as_deref().unwrap_or(""), corrected);
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO learned_patterns (pattern_type, pattern_value, category, confidence, usage_count, last_used)
                 VALUES (?1, ?2, ?3, ?4, 1, ?5)
                 ON CONFLICT (pattern_type, pattern_value, category) DO UPDATE SET
                    confidence = MIN(?6, confidence + ?7),
                    usage_count = usage_count + 1,
                    last_used = excluded.last_used",
            )?;
            for (kind, value) in &observed {
                stmt.execute(params![
                    kind.as_str(),
                    value,
                    corrected,
                    LEARNED_INITIAL,
                    now,
                    MAX_PATTERN_CONFIDENCE,
                    CORRECTION_STEP
                ])?;
            }
        }

        tx.commit()?;
        tracing::info!(filename, category = corrected, patterns = observed.len(), "Correction recorded");
        Ok(Some(observed.len()))
    }

    // ═══════════════════════════════════════════════════════════
    // Inspection
    // ═══════════════════════════════════════════════════════════

    pub fn pattern(
        &self,
        pattern_type: PatternType,
        value: &str,
        category: &str,
    ) -> Result<Option<LearnedPattern>, PatternStoreError> {
        let conn = self.lock()?;
        let found = conn
            .query_row(
                "SELECT confidence, usage_count, last_used FROM learned_patterns
                 WHERE pattern_type = ?1 AND pattern_value = ?2 AND category = ?3",
                params![pattern_type.as_str(), value, category],
                |row| {
                    Ok(LearnedPattern {
                        pattern_type,
                        value: value.to_string(),
                        category: category.to_string(),
                        confidence: row.get(0)?,
                        usage_count: row.get(1)?,
                        last_used: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(found)
    }

    pub fn pattern_count(&self) -> Result<i64, PatternStoreError> {
        let conn = self.lock()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM learned_patterns", [], |row| row.get(0))?)
    }

    pub fn performance_report(&self) -> Result<PerformanceReport, PatternStoreError> {
        let conn = self.lock()?;
        let count = |sql: &str| conn.query_row(sql, [], |row| row.get::<_, i64>(0));

        let total_classifications = count("SELECT COUNT(*) FROM classification_history")?;
        let total_corrections = count("SELECT COUNT(*) FROM classification_history WHERE feedback_given = 1")?;
        let learned_patterns = count("SELECT COUNT(DISTINCT pattern_value) FROM learned_patterns")?;
        let positive_feedback = count("SELECT COUNT(*) FROM user_feedback WHERE is_positive = 1")?;
        let negative_feedback = count("SELECT COUNT(*) FROM user_feedback WHERE is_positive = 0")?;

        let feedback_by_category = {
            let mut stmt = conn.prepare(
                "SELECT category,
                        SUM(CASE WHEN is_positive = 1 THEN 1 ELSE 0 END) AS likes,
                        SUM(CASE WHEN is_positive = 0 THEN 1 ELSE 0 END) AS dislikes
                 FROM user_feedback
                 GROUP BY category
                 ORDER BY (likes + dislikes) DESC, category ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(CategoryFeedback {
                    category: row.get(0)?,
                    likes: row.get(1)?,
                    dislikes: row.get(2)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        let category_stats = {
            let mut stmt = conn.prepare(
                "SELECT category, total_classifications, correct_classifications, accuracy_rate
                 FROM performance_stats
                 ORDER BY total_classifications DESC, category ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(CategoryStats {
                    category: row.get(0)?,
                    total_classifications: row.get(1)?,
                    correct_classifications: row.get(2)?,
                    accuracy_rate: row.get(3)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        Ok(PerformanceReport {
            total_classifications,
            total_corrections,
            learned_patterns,
            positive_feedback,
            negative_feedback,
            feedback_by_category,
            category_stats,
        })
    }
}

/// `confidence × (1 + min(usage × 0.1, 2.0))`
fn pattern_score(confidence: f64, usage_count: i64) -> f64 {
    confidence * (1.0 + (usage_count as f64 * USAGE_BOOST_PER_USE).min(USAGE_BOOST_CAP))
}

fn accumulate(scores: &mut Vec<(String, f64, usize)>, category: String, score: f64) {
    match scores.iter_mut().find(|(c, _, _)| *c == category) {
        Some(entry) => {
            entry.1 += score;
            entry.2 += 1;
        }
        None => scores.push((category, score, 1)),
    }
}

/// Filename tokens plus content signals a verdict for `category` teaches.
fn observed_patterns(filename: &str, text: &str, category: &str) -> Vec<(PatternType, String)> {
    filename_tokens(filename)
        .into_iter()
        .map(|t| (PatternType::Filename, t))
        .chain(content_signals(text, category).into_iter().map(|s| (PatternType::Content, s)))
        .collect()
}

fn insert_feedback(
    tx: &Transaction<'_>,
    filename: &str,
    category: &str,
    positive: bool,
    now: &str,
) -> Result<(), rusqlite::Error> {
    tx.execute(
        "INSERT INTO user_feedback (filename, category, is_positive, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![filename, category, positive, now],
    )?;
    Ok(())
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
