//! Prompt text for each study tool.

use crate::timetable::RevisionRequest;

pub fn study_tip(topic: &str) -> String {
    format!(
        "Provide a concise, actionable, and encouraging study tip for the topic: \"{}\". \
         Make it sound like it's from an expert tutor. Focus on one key piece of advice. \
         Maximum 2-3 sentences.",
        topic.trim()
    )
}

pub fn motivational_quote() -> String {
    "Generate an inspiring and motivational quote specifically for students studying maths, \
     physics, or coding. The quote should be encouraging, uplifting, and help them push through \
     difficult study sessions. Make it original and powerful. Just return the quote without any \
     extra text or quotation marks."
        .to_string()
}

pub fn problem_breakdown(problem: &str) -> String {
    format!(
        r#"SYSTEM INSTRUCTION:
You break physics and mathematics problems down into clear, structured steps. Return ONLY a valid JSON object matching the schema below, with no text, markdown or notes outside it.

JSON RULES:
- Use double quotes only; no trailing commas
- Escape quotes inside strings with \"
- Double every LaTeX backslash (write \\frac, \\sqrt, \\alpha)
- Use $...$ for inline math and $$...$$ for block math

PROBLEM TO SOLVE:
"{problem}"

INSTRUCTIONS:
1. Identify the given information and what must be found
2. Break the solution into clear, logical steps with all calculations shown
3. Give the final answer with proper units

REQUIRED JSON OUTPUT SCHEMA:
{{
  "title": "Problem Breakdown",
  "problem": "The original problem statement",
  "given": ["List of given information and values"],
  "find": "What we need to find or calculate",
  "principles": ["Relevant formulas, laws, or principles"],
  "steps": [
    {{
      "step": <integer>,
      "description": "What this step accomplishes",
      "calculation": "The mathematical work for this step",
      "result": "The result of this step (with units if applicable)"
    }}
  ],
  "finalAnswer": "The final answer with proper units",
  "concept": "Brief explanation of the key concept involved"
}}

Start your response with {{ and end with }}."#,
        problem = problem.trim()
    )
}

pub fn revision_timetable(request: &RevisionRequest, last_exam_date: &str) -> String {
    let exams = request
        .exams
        .iter()
        .map(|exam| {
            let tasks: Vec<&str> = exam
                .tasks
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .collect();
            let task_list = if tasks.is_empty() {
                String::new()
            } else {
                format!(" (Specific tasks: {})", tasks.join(", "))
            };
            format!(
                "- Subject: {}, Exam Date: {}{}",
                exam.subject, exam.date, task_list
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let study_times = if request.study_times.is_empty() {
        "The user has not specified preferred study times. Please allocate the study sessions \
         evenly throughout the week, prioritizing evenings on weekdays and afternoons on weekends."
            .to_string()
    } else {
        request
            .study_times
            .iter()
            .map(|(day, slots)| format!("- {}: {}", day, slots.join(", ")))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"SYSTEM INSTRUCTION:
You create personalised revision timetables. Return ONLY a valid JSON object matching the schema below, with no text, markdown or notes outside it.

USER DATA:

1. EXAM SCHEDULE AND TASKS:
{exams}

2. REVISION PREFERENCES:
- Revision Start Date: {start}
- Final Exam Date: {last}
- Target Study Hours Per Week: {hours}

3. PREFERRED STUDY TIMES:
{study_times}

PLANNING INSTRUCTIONS:
1. Use ONLY the user data above; prioritise subjects with earlier exam dates.
2. Break subjects into specific, manageable topics and schedule every user task as a high-priority item.
3. Distribute sessions across the preferred study times; each session lasts 60 to 120 minutes.
4. Weekly study time should be close to the target hours, with at least one rest or light day per week.
5. Cover the period from the start date up to (but not including) the final exam date.
6. Write every session time as "HH:MM - HH:MM" in 24-hour format.

REQUIRED JSON OUTPUT SCHEMA:
{{
  "title": "Your Personalised Revision Timetable",
  "summary": "A 1-2 sentence summary mentioning the number of weeks and total hours.",
  "weeklySchedule": [
    {{
      "week": <integer>,
      "dates": "YYYY-MM-DD to YYYY-MM-DD",
      "dailySessions": [
        {{
          "day": "Monday",
          "tasks": [
            {{ "time": "18:00 - 19:30", "subject": "<string>", "topic": "<string>" }}
          ]
        }}
      ]
    }}
  ]
}}"#,
        exams = exams,
        start = request.start_date,
        last = last_exam_date,
        hours = request.hours_per_week,
        study_times = study_times,
    )
}
