use crate::models::GenerationRequest;

/// Builds the roadmap prompt. Topic, level and duration appear verbatim; the
/// JSON template has the requested level and duration pre-filled so the model
/// echoes them back.
pub fn build_roadmap_prompt(req: &GenerationRequest) -> String {
    let topic = req.topic();
    let level = req.level();
    let duration = req.duration();
    let context = req
        .additional_info()
        .map(|info| format!(" Additional context: {info}"))
        .unwrap_or_default();

    format!(
        r#"Create a comprehensive learning roadmap for "{topic}" for a {level} level learner over {duration}.{context}

Please provide a structured response in the following JSON format:
{{
  "title": "Learning Roadmap Title",
  "description": "Brief description of what the learner will achieve",
  "level": "{level}",
  "totalDuration": "{duration}",
  "phases": [
    {{
      "id": "phase-1",
      "title": "Phase Title",
      "description": "What the learner will accomplish in this phase",
      "duration": "Time needed for this phase",
      "resources": [
        {{
          "title": "Resource Title",
          "url": "https://example.com",
          "type": "video",
          "platform": "YouTube",
          "duration": "estimated time"
        }}
      ],
      "projects": ["Project suggestions for this phase"],
      "prerequisites": ["What should be completed before this phase"]
    }}
  ]
}}

Make sure to:
1. Include 4-6 phases for comprehensive learning
2. Provide real, actionable resources with actual URLs when possible
3. Include a mix of videos, articles, courses, and hands-on projects (resource type is one of: video, article, course, documentation, project)
4. Make each phase build upon the previous one
5. Include popular platforms like YouTube, Coursera, freeCodeCamp, Udemy, official documentation
6. Ensure resources are high-quality and relevant
7. Return only valid JSON without any markdown formatting or additional text"#
    )
}
