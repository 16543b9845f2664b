//! Prompt construction for the task-ranking request.

use crate::types::Task;
use std::fmt::Write as _;

/// Build the natural-language analysis prompt: one line per task plus
/// strict formatting instructions so the response is machine-readable.
pub fn build_analysis_prompt(tasks: &[Task]) -> String {
    let mut prompt = String::from(
        "You are a productivity assistant. Analyze the following todo tasks \
         and rank them by execution priority.\n\nTasks:\n",
    );
    for (i, task) in tasks.iter().enumerate() {
        let _ = writeln!(
            prompt,
            "{}. \"{}\" (status: {}, created: {})",
            i + 1,
            task.name,
            task.status,
            task.created_at.to_rfc3339(),
        );
    }
    prompt.push_str(
        "\nRespond with ONLY a JSON array, one object per task in the order \
         given, each shaped as:\n\
         {\"priority\": <integer 1-10, 10 = most urgent>, \
         \"reasoning\": <short explanation>, \
         \"suggestedOrder\": <integer, 1 = do first>, \
         \"estimatedImpact\": <\"low\" | \"medium\" | \"high\">, \
         \"tags\": [<short keyword strings>]}\n\
         Do not wrap the array in markdown fences or add any prose.",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_enumerates_every_task() {
        let tasks = vec![Task::new("1", "write report"), Task::new("2", "file taxes")];
        let prompt = build_analysis_prompt(&tasks);
        assert!(prompt.contains("1. \"write report\""));
        assert!(prompt.contains("2. \"file taxes\""));
        assert!(prompt.contains("status: pending"));
    }

    #[test]
    fn test_prompt_requests_json_shape() {
        let prompt = build_analysis_prompt(&[Task::new("1", "a")]);
        for field in ["priority", "reasoning", "suggestedOrder", "estimatedImpact", "tags"] {
            assert!(prompt.contains(field), "missing field {}", field);
        }
    }
}
