//! UI rendering for quiz battle.

use crate::app::{App, View};
use crate::battle::BattleSession;
use crate::models::{Outcome, PartyState, Phase};
use crate::scoring;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Row, Table, Wrap},
    Frame,
};

const OPTION_KEYS: [char; 4] = ['A', 'B', 'C', 'D'];

pub fn draw(f: &mut Frame, app: &App) {
    match app.view {
        View::Lobby => draw_lobby(f, app),
        View::Battle => draw_battle(f, app),
        View::Results => draw_results(f, app),
    }

    if app.show_help {
        draw_help(f);
    }

    if let Some(msg) = &app.message {
        draw_message(f, msg);
    }
}

fn draw_lobby(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(10),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    let header = Paragraph::new("Quiz Battle")
        .style(Style::default().add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    let profile = &app.profile;
    let rows = vec![
        Row::new(vec!["Player".to_string(), profile.username.clone()]),
        Row::new(vec!["Battles".to_string(), profile.battles.to_string()]),
        Row::new(vec![
            "W / L / D".to_string(),
            format!("{} / {} / {}", profile.wins, profile.losses, profile.draws),
        ]),
        Row::new(vec!["Accuracy".to_string(), format!("{:.0}%", profile.accuracy() * 100.0)]),
        Row::new(vec!["Best streak".to_string(), profile.best_streak.to_string()]),
        Row::new(vec![
            "Difficulty".to_string(),
            profile.preferred_level.map(|l| l.name()).unwrap_or("Any").to_string(),
        ]),
        Row::new(vec!["Focus".to_string(), app.focus.name().to_string()]),
        Row::new(vec!["Opponent".to_string(), app.config.opponent.name.clone()]),
    ];
    let table = Table::new(rows, [Constraint::Length(14), Constraint::Min(0)])
        .block(Block::default().borders(Borders::ALL).title(" Profile "));
    f.render_widget(table, chunks[1]);

    let mut lines = Vec::new();
    match &app.last_summary {
        Some(summary) => {
            lines.push(Line::from(Span::styled(
                format!("Last battle: {}", summary),
                Style::default().fg(outcome_color(summary.outcome)),
            )));
        }
        None => lines.push(Line::from("No battles yet. Press Enter to start one.")),
    }
    let weak = profile.weak_topics();
    if !weak.is_empty() {
        lines.push(Line::from(vec![
            Span::raw("Weak topics: "),
            Span::styled(weak.join(", "), Style::default().fg(Color::Red)),
        ]));
    }
    if let Some(rec) = &app.recommendation {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::raw("Recommended difficulty: "),
            Span::styled(rec.level.name(), Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        ]));
        lines.push(Line::from(Span::styled(rec.reason, Style::default().fg(Color::DarkGray))));
    }
    let info = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Recent "));
    f.render_widget(info, chunks[2]);

    let footer = Paragraph::new("Enter:Battle  d:Difficulty  w:Weak topics  r:Apply recommendation  ?:Help  q:Quit")
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, chunks[3]);
}

fn draw_battle(f: &mut Frame, app: &App) {
    let Some(battle) = &app.battle else {
        return;
    };
    let session = battle.session();

    if session.phase == Phase::Countdown {
        draw_countdown(f, session);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(4),
        ])
        .split(f.area());

    draw_scoreboard(f, app, session, chunks[0]);

    let Some(question) = session.current_question() else {
        return;
    };

    let ratio = if question.time_limit_secs == 0 {
        0.0
    } else {
        session.question_time_remaining as f64 / question.time_limit_secs as f64
    };
    let timer_color = if session.question_time_remaining <= 5 {
        Color::Red
    } else {
        Color::Green
    };
    let timer = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(format!(
            " Question {} of {} ",
            session.current_question_index + 1,
            session.questions.len()
        )))
        .gauge_style(Style::default().fg(timer_color))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(format!("{}s", session.question_time_remaining));
    f.render_widget(timer, chunks[1]);

    let body = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(chunks[2]);

    let title = format!(" {} - {} ", question.topic, question.difficulty.name());
    let text = Paragraph::new(question.text.as_str())
        .alignment(Alignment::Center)
        .style(Style::default().add_modifier(Modifier::BOLD))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(text, body[0]);

    let player_choice = session
        .player
        .answer_for(session.current_question_index)
        .and_then(|a| a.choice);
    let revealing = session.revealing();

    let items: Vec<ListItem> = question
        .options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let mut style = Style::default();
            if revealing {
                if i == question.correct_option {
                    style = style.fg(Color::Green).add_modifier(Modifier::BOLD);
                } else if Some(i) == player_choice {
                    style = style.fg(Color::Red);
                }
            } else if i == app.selected_option {
                style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
            }
            let key = OPTION_KEYS.get(i).copied().unwrap_or('?');
            ListItem::new(format!(" [{}] {}", key, option)).style(style)
        })
        .collect();
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Options "));
    f.render_widget(list, body[1]);

    let mut footer = vec![Line::from(Span::styled(
        "1-4/a-d:Answer  j/k:Select  Enter:Submit  Esc:Abandon",
        Style::default().fg(Color::DarkGray),
    ))];
    if app.config.display.show_time_bonus && !revealing {
        footer.push(Line::from(format!(
            "Correct now: +{} points",
            scoring::points(question.difficulty, session.question_time_remaining)
        )));
    }
    let footer = Paragraph::new(footer).block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, chunks[3]);
}

fn draw_countdown(f: &mut Frame, session: &BattleSession) {
    let area = centered_rect(40, 30, f.area());
    let lines = vec![
        Line::from(format!("{} vs {}", session.player.display_name, session.opponent.display_name)),
        Line::from(""),
        Line::from(Span::styled(
            session.countdown_remaining.to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Get ready!"),
    ];
    let countdown = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" Battle starting "));
    f.render_widget(countdown, area);
}

fn draw_scoreboard(f: &mut Frame, app: &App, session: &BattleSession, area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    f.render_widget(party_line(&session.player, None, Color::Cyan), halves[0]);

    let status = if !app.config.display.show_opponent_progress {
        None
    } else if session.opponent_resolved() {
        Some("answered")
    } else {
        Some("thinking...")
    };
    f.render_widget(party_line(&session.opponent, status, Color::Magenta), halves[1]);
}

fn party_line<'a>(party: &'a PartyState, status: Option<&'a str>, color: Color) -> Paragraph<'a> {
    let mut spans = vec![
        Span::styled(party.display_name.as_str(), Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::raw(format!("  {} pts  streak {}", party.score, party.streak)),
    ];
    if let Some(status) = status {
        spans.push(Span::styled(format!("  ({})", status), Style::default().fg(Color::DarkGray)));
    }
    Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL))
}

fn draw_results(f: &mut Frame, app: &App) {
    let Some(battle) = &app.battle else {
        return;
    };
    let session = battle.session();
    let Some(summary) = session.summary() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
        .split(f.area());

    let color = outcome_color(summary.outcome);
    let headline = Paragraph::new(vec![
        Line::from(Span::styled(
            summary.outcome.headline(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(summary.outcome.message()),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(headline, chunks[0]);

    let max = scoring::max_score(&session.questions);
    let score_pct = if max == 0 {
        0.0
    } else {
        summary.player_score as f64 / max as f64 * 100.0
    };
    let rows = vec![
        Row::new(vec![
            "Score".to_string(),
            summary.player_score.to_string(),
            summary.opponent_score.to_string(),
        ]),
        Row::new(vec![
            "Accuracy".to_string(),
            format!("{}%", summary.accuracy_percent()),
            format!("{:.0}%", summary.opponent_accuracy * 100.0),
        ]),
        Row::new(vec![
            "Best streak".to_string(),
            summary.best_streak.to_string(),
            session.opponent.best_streak.to_string(),
        ]),
        Row::new(vec![
            "Answered".to_string(),
            format!("{}/{}", summary.questions_answered, summary.question_count),
            format!("{}/{}", session.opponent.answered_count, summary.question_count),
        ]),
        Row::new(vec![
            "Avg time".to_string(),
            format!("{:.1}s", summary.average_response_secs),
            String::new(),
        ]),
        Row::new(vec!["Score %".to_string(), format!("{:.0}%", score_pct), String::new()]),
    ];
    let table = Table::new(
        rows,
        [Constraint::Length(14), Constraint::Percentage(40), Constraint::Percentage(40)],
    )
    .header(
        Row::new(vec![
            String::new(),
            session.player.display_name.clone(),
            session.opponent.display_name.clone(),
        ])
        .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title(" Battle stats "));
    f.render_widget(table, chunks[1]);

    let footer = Paragraph::new("Enter:Continue  r:Continue with recommended difficulty")
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, chunks[2]);
}

fn outcome_color(outcome: Outcome) -> Color {
    match outcome {
        Outcome::Win => Color::Green,
        Outcome::Lose => Color::Red,
        Outcome::Draw => Color::Yellow,
    }
}

fn draw_help(f: &mut Frame) {
    let area = centered_rect(60, 80, f.area());
    f.render_widget(Clear, area);

    let help = r#"
Quiz Battle Keybindings

Lobby:
  Enter, Space    Start a battle
  d               Cycle difficulty filter
  w               Toggle weak-topic focus
  r               Apply recommended difficulty
  q               Quit

Battle:
  1-4, a-d        Answer
  j/k, Up/Down    Move selection
  Enter, Space    Submit selection
  Esc             Abandon battle

Results:
  Enter           Record result and continue
  r               Record result and apply recommended difficulty

General:
  ?               Show this help

Press any key to close
"#;

    let popup = Paragraph::new(help)
        .block(Block::default().borders(Borders::ALL).title(" Help "))
        .wrap(Wrap { trim: false });
    f.render_widget(popup, area);
}

fn draw_message(f: &mut Frame, msg: &str) {
    let area = Rect::new(
        f.area().x + 2,
        f.area().height.saturating_sub(5),
        f.area().width.saturating_sub(4),
        3,
    );
    f.render_widget(Clear, area);

    let message = Paragraph::new(msg)
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(message, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::QuestionBank;
    use crate::clock::ManualClock;
    use crate::config::Config;
    use crate::db::Database;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Duration;

    fn render(app: &App) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn app_with_clock() -> (App, ManualClock) {
        let mut config = Config::default();
        config.opponent.strategy = "silent".to_string();
        let clock = ManualClock::new();
        let app = App::with_parts(
            config,
            Database::in_memory().unwrap(),
            QuestionBank::builtin(),
            Box::new(clock.clone()),
        )
        .unwrap();
        (app, clock)
    }

    #[test]
    fn test_lobby_renders_profile() {
        let (app, _clock) = app_with_clock();
        let screen = render(&app);
        assert!(screen.contains("Quiz Battle"));
        assert!(screen.contains("sarah_chen"));
        assert!(screen.contains("No battles yet"));
    }

    #[test]
    fn test_lobby_shows_weak_topics() {
        let (mut app, _clock) = app_with_clock();
        app.profile.topic_stats.insert(
            "Calculus".to_string(),
            crate::summary::TopicTally { correct: 1, total: 4 },
        );
        app.focus = crate::app::Focus::WeakTopics;
        let screen = render(&app);
        assert!(screen.contains("Weak topics: Calculus"));
        assert!(screen.contains("Focus"));
    }

    #[test]
    fn test_battle_screens_render() {
        let (mut app, clock) = app_with_clock();
        app.start_battle();
        assert!(render(&app).contains("Get ready!"));

        clock.advance(Duration::from_secs(3));
        app.tick();
        let screen = render(&app);
        assert!(screen.contains("derivative"));
        assert!(screen.contains("Question 1 of 5"));

        clock.advance(Duration::from_secs(300));
        app.tick();
        assert_eq!(app.view, View::Results);
        let screen = render(&app);
        assert!(screen.contains("Battle stats"));
        assert!(screen.contains("It's a Draw!"));
    }
}
