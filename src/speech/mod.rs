//! Text-to-speech synthesis for question/answer pairs.

mod openai;

pub use openai::OpenAISpeech;

use crate::audio::AudioSegment;
use crate::error::Result;
use async_trait::async_trait;
use tracing::instrument;

/// Trait for speech synthesis backends.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` spoken in `language`.
    async fn synthesize(&self, text: &str, language: &str) -> Result<AudioSegment>;
}

/// Voice a question followed by its answer, then apply the playback speed.
#[instrument(skip_all, fields(speed = speed))]
pub async fn synthesize_pair(
    synthesizer: &dyn SpeechSynthesizer,
    question: &str,
    answer: &str,
    language: &str,
    speed: f32,
) -> Result<AudioSegment> {
    let question_audio = synthesizer.synthesize(question, language).await?;
    let answer_audio = synthesizer.synthesize(answer, language).await?;

    let mut pair = AudioSegment::empty();
    pair.append(&question_audio);
    pair.append(&answer_audio);
    pair.with_speed(speed)
}

/// Split text into pieces of at most `max_chars` characters, preferring whitespace.
pub fn split_for_synthesis(text: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            pieces.extend(chars.chunks(max_chars).map(|c| c.iter().collect::<String>()));
            continue;
        }

        let joiner = if current.is_empty() { 0 } else { 1 };
        if current_len + joiner + word_len > max_chars {
            pieces.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingSynthesizer, SilenceSynthesizer};

    #[tokio::test]
    async fn test_pair_is_question_then_answer() {
        let synth = SilenceSynthesizer::default();
        let question = "Why?";
        let answer = "Because it is so.";

        let q = synth.synthesize(question, "en").await.unwrap();
        let a = synth.synthesize(answer, "en").await.unwrap();
        let pair = synthesize_pair(&synth, question, answer, "en", 1.0).await.unwrap();

        assert!((pair.duration_secs() - (q.duration_secs() + a.duration_secs())).abs() < 0.001);
        assert_eq!(
            synth.calls(),
            vec![
                question.to_string(),
                answer.to_string(),
                question.to_string(),
                answer.to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_pair_speed_adjusted() {
        let synth = SilenceSynthesizer::default();
        let normal = synthesize_pair(&synth, "Question here", "Answer there", "en", 1.0)
            .await
            .unwrap();
        let fast = synthesize_pair(&synth, "Question here", "Answer there", "en", 1.25)
            .await
            .unwrap();

        assert!((fast.duration_secs() - normal.duration_secs() / 1.25).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_pair_failure_propagates() {
        let result = synthesize_pair(&FailingSynthesizer, "q", "a", "en", 1.25).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_split_for_synthesis() {
        assert!(split_for_synthesis("", 10).is_empty());
        assert_eq!(split_for_synthesis("short text", 100), vec!["short text"]);

        let pieces = split_for_synthesis("one two three four five", 9);
        assert_eq!(pieces, vec!["one two", "three", "four five"]);

        let pieces = split_for_synthesis("巴黎是法国的首都", 3);
        assert_eq!(pieces, vec!["巴黎是", "法国的", "首都"]);
    }
}
