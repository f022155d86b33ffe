// src/templates.rs
//! HTML pages for the polls views.
//!
//! Pages are small enough to build with `format!`. Anything that came from the
//! database or a form goes through [`escape`] first.
use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::{Choice, Question};

pub const NO_POLLS: &str = "No polls are available.";
pub const NO_CHOICE_SELECTED: &str = "You didn't select a choice.";
pub const NO_NAME_ENTERED: &str = "You didn't enter your name.";

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape(title),
        body
    )
}

pub fn index(questions: &[Question], now: DateTime<Utc>) -> String {
    let mut body = String::from("<h1>Polls</h1>\n");

    if questions.is_empty() {
        let _ = writeln!(body, "<p>{NO_POLLS}</p>");
        return page("Polls", &body);
    }

    body.push_str("<ul>\n");
    for question in questions {
        let badge = if question.was_published_recently(now) {
            " <small>new</small>"
        } else {
            ""
        };
        let _ = writeln!(
            body,
            "<li><a href=\"/polls/{}/\">{}</a>{}</li>",
            question.id,
            escape(&question.question_text),
            badge
        );
    }
    body.push_str("</ul>\n");

    page("Polls", &body)
}

pub fn detail(question: &Question, choices: &[Choice], error_message: Option<&str>) -> String {
    let mut body = format!("<h1>{}</h1>\n", escape(&question.question_text));

    if let Some(message) = error_message {
        let _ = writeln!(body, "<p class=\"error\"><strong>{}</strong></p>", escape(message));
    }

    let _ = writeln!(body, "<form action=\"/polls/{}/vote/\" method=\"post\">", question.id);
    for choice in choices {
        let _ = writeln!(
            body,
            "<input type=\"radio\" name=\"choice\" id=\"choice{id}\" value=\"{id}\">\n<label for=\"choice{id}\">{text}</label><br>",
            id = choice.id,
            text = escape(&choice.choice_text)
        );
    }
    body.push_str("<label for=\"name\">Your name</label>\n<input type=\"text\" name=\"name\" id=\"name\">\n");
    body.push_str("<input type=\"submit\" value=\"Vote\">\n</form>\n");

    page(&question.question_text, &body)
}

pub fn results(question: &Question, choices: &[Choice]) -> String {
    let mut body = format!("<h1>{}</h1>\n<ul>\n", escape(&question.question_text));

    for choice in choices {
        let noun = if choice.votes == 1 { "vote" } else { "votes" };
        let _ = writeln!(
            body,
            "<li>{} -- {} {}</li>",
            escape(&choice.choice_text),
            choice.votes,
            noun
        );
    }
    body.push_str("</ul>\n");
    let _ = writeln!(body, "<a href=\"/polls/{}/\">Vote again?</a>", question.id);

    page(&question.question_text, &body)
}
