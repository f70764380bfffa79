// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rendering. Pure view over the model, with no state of its own beyond
//! layout arithmetic, which is shared with mouse hit-testing.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap};
use ratatui::Frame;

use rj_core::Clock as _;
use rj_core::{format_elapsed, parse_mib, Host, HostStatus, JobStatus, SystemClock};

use crate::app::{App, DetailTab, Modal, View};
use crate::form;

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let [main, flash] = split_vertical(area, &[Constraint::Min(3), Constraint::Length(1)]);

    match app.view {
        View::Jobs => render_jobs_view(frame, app, main),
        View::Hosts => render_hosts_view(frame, app, main),
    }

    render_flash(frame, app, flash);

    match &app.modal {
        Some(Modal::NewJob(job_form)) => render_form(frame, job_form, area),
        Some(Modal::Progress { title, started }) => render_progress(frame, title, started, area),
        Some(Modal::Help) => render_help(frame, area),
        None => {}
    }
}

// --- layout arithmetic shared with hit-testing ---

fn split_vertical(area: Rect, constraints: &[Constraint]) -> [Rect; 2] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints.to_vec())
        .split(area);
    [chunks[0], chunks[1]]
}

fn jobs_layout(app: &App) -> (Rect, Rect) {
    let area = Rect::new(0, 0, app.size.0, app.size.1.saturating_sub(1));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    (chunks[0], chunks[1])
}

fn hosts_layout(app: &App) -> (Rect, Rect) {
    let area = Rect::new(0, 0, app.size.0, app.size.1.saturating_sub(1));
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);
    (chunks[0], chunks[1])
}

/// Rows visible in the jobs table body.
fn job_rows_visible(app: &App) -> usize {
    let (list, _) = jobs_layout(app);
    // Top border, header row, bottom border.
    list.height.saturating_sub(3) as usize
}

/// First row index shown, keeping the selection in view.
fn job_scroll_offset(app: &App) -> usize {
    let visible = job_rows_visible(app);
    if visible == 0 {
        return 0;
    }
    let selected = app
        .selected
        .and_then(|id| app.visible_jobs().iter().position(|j| j.id == id))
        .unwrap_or(0);
    selected.saturating_sub(visible - 1)
}

/// Map a terminal row to a job id (mouse selection).
pub fn job_row_at(app: &App, row: u16) -> Option<i64> {
    let (list, _) = jobs_layout(app);
    if row < list.y + 2 || row >= list.y + list.height.saturating_sub(1) {
        return None;
    }
    let index = (row - list.y - 2) as usize + job_scroll_offset(app);
    app.visible_jobs().get(index).map(|j| j.id)
}

/// Map a terminal row to a host index (mouse selection).
pub fn host_row_at(app: &App, row: u16) -> Option<usize> {
    let (list, _) = hosts_layout(app);
    if row < list.y + 1 || row >= list.y + list.height.saturating_sub(1) {
        return None;
    }
    let index = (row - list.y - 1) as usize;
    if index < app.hosts.len() {
        Some(index)
    } else {
        None
    }
}

/// Lines per page in the log viewport.
pub fn log_page_size(app: &App) -> usize {
    let (_, detail) = jobs_layout(app);
    detail.height.saturating_sub(3).max(1) as usize
}

// --- jobs view ---

fn render_jobs_view(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_job_table(frame, app, chunks[0]);
    render_job_detail(frame, app, chunks[1]);
}

fn render_job_table(frame: &mut Frame, app: &App, area: Rect) {
    let now = SystemClock.epoch_secs();
    let visible = app.visible_jobs();
    let offset = job_scroll_offset(app);
    let rows_visible = job_rows_visible(app);

    let rows: Vec<Row> = visible
        .iter()
        .skip(offset)
        .take(rows_visible)
        .map(|job| {
            let selected = app.selected == Some(job.id);
            let elapsed = job
                .elapsed_secs(now)
                .map(format_elapsed)
                .unwrap_or_else(|| "-".to_string());
            let what = job
                .description
                .clone()
                .unwrap_or_else(|| job.command.clone());
            let style = if selected {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(job.id.to_string()),
                Cell::from(Span::styled(
                    job.status.to_string(),
                    status_style(job.status),
                )),
                Cell::from(job.host.clone()),
                Cell::from(elapsed),
                Cell::from(what),
            ])
            .style(style)
        })
        .collect();

    let syncing = if app.syncing { " (syncing…)" } else { "" };
    let title = format!(
        " jobs [{}] {}/{}{} ",
        app.filter.label(),
        visible.len(),
        app.jobs.len(),
        syncing
    );
    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(10),
            Constraint::Length(16),
            Constraint::Length(8),
            Constraint::Min(20),
        ],
    )
    .header(
        Row::new(vec!["id", "status", "host", "elapsed", "description"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(table, area);
}

fn render_job_detail(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let selected_tab = match app.tab {
        DetailTab::Details => 0,
        DetailTab::Logs => 1,
    };
    let tabs = Tabs::new(vec!["Details", "Logs"])
        .select(selected_tab)
        .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED));
    frame.render_widget(tabs, chunks[0]);

    match app.tab {
        DetailTab::Details => render_details_tab(frame, app, chunks[1]),
        DetailTab::Logs => render_logs_tab(frame, app, chunks[1]),
    }
}

fn render_details_tab(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL);
    let Some(job) = app.selected_job() else {
        frame.render_widget(
            Paragraph::new("no job selected").block(block),
            area,
        );
        return;
    };

    let mut lines: Vec<Line> = Vec::new();

    push_field(&mut lines, "id", job.id.to_string());
    push_field(&mut lines, "host", job.host.clone());
    push_field(&mut lines, "status", job.status.to_string());
    if let Some(desc) = &job.description {
        push_field(&mut lines, "description", desc.clone());
    }
    push_field(&mut lines, "command", job.command.clone());
    push_field(&mut lines, "working dir", job.working_dir.clone());
    if let Some(queue) = &job.queue {
        push_field(&mut lines, "queue", queue.clone());
    }
    if !job.env_vars.is_empty() {
        push_field(&mut lines, "env", job.env_vars.join(" "));
    }
    if job.start_time > 0 {
        push_field(&mut lines, "started", job.start_time.to_string());
    }
    if let Some(end) = job.end_time {
        push_field(&mut lines, "ended", end.to_string());
    }
    if let Some(code) = job.exit_code {
        push_field(&mut lines, "exit code", code.to_string());
    }
    if let Some(err) = &job.error {
        lines.push(Line::from(Span::styled(
            format!("       error: {err}"),
            Style::default().fg(Color::Red),
        )));
    }
    if job.status == JobStatus::Running && job.session.is_some() {
        push_field(
            &mut lines,
            "attach",
            format!("ssh -t {} tmux attach -t {}", job.host, job.tmux_session()),
        );
    }

    if app.stats.job_id == Some(job.id) {
        if let Some(stats) = &app.stats.current {
            lines.push(Line::default());
            let cpu = stats
                .cpu_percent
                .map(|p| format!("{p:.0}%"))
                .unwrap_or_else(|| "…".to_string());
            let mem_pct = stats
                .mem_percent
                .map(|p| format!(" ({p:.1}%)"))
                .unwrap_or_default();
            push_field(
                &mut lines,
                "pid",
                format!("{} ({} threads)", stats.pid, stats.threads),
            );
            push_field(&mut lines, "cpu", format!("{cpu} (total {})", stats.cpu_time));
            push_field(&mut lines, "memory", format!("{}{mem_pct}", stats.mem_rss));
            for gpu in &stats.gpus {
                push_field(
                    &mut lines,
                    &format!("gpu {}", gpu.index),
                    format!("{}% {}MiB", gpu.utilization_pct, gpu.memory_mib),
                );
            }
        }
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_logs_tab(frame: &mut Frame, app: &App, area: Rect) {
    let mut title = String::from(" logs ");
    if app.log.offline {
        title = String::from(" logs (cached - host offline) ");
    }
    let style = if app.log.offline {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(title, style));

    let height = area.height.saturating_sub(2) as usize;
    let start = app.log.offset.min(app.log.lines.len().saturating_sub(height));
    let lines: Vec<Line> = app
        .log
        .lines
        .iter()
        .skip(start)
        .take(height)
        // Raw lines. No ANSI interpretation, no wrapping games.
        .map(|l| Line::from(l.as_str()))
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

// --- hosts view ---

fn render_hosts_view(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    let lines: Vec<Line> = app
        .hosts
        .values()
        .enumerate()
        .map(|(i, host)| {
            let style = if i == app.selected_host {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!("{:<20}", host.name), style),
                Span::styled(host.status.to_string(), host_status_style(host.status)),
            ])
        })
        .collect();
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" hosts ")),
        chunks[0],
    );

    render_host_detail(frame, app.current_host(), chunks[1]);
}

fn render_host_detail(frame: &mut Frame, host: Option<&Host>, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" host ");
    let Some(host) = host else {
        frame.render_widget(Paragraph::new("no hosts known").block(block), area);
        return;
    };

    let mut lines: Vec<Line> = Vec::new();

    push_field(&mut lines, "status", host.status.to_string());
    push_field(&mut lines, "arch", host.arch.clone());
    push_field(&mut lines, "os", host.os_version.clone());
    push_field(&mut lines, "model", host.hardware_model.clone());
    let cpu = if host.cpu_count > 0 {
        format!("{} ({} cores)", host.cpu_model, host.cpu_count)
    } else {
        host.cpu_model.clone()
    };
    push_field(&mut lines, "cpu", cpu);
    let mem = if host.memory_used.is_empty() {
        host.total_memory.clone()
    } else {
        format!("{} used / {}", host.memory_used, host.total_memory)
    };
    push_field(&mut lines, "memory", mem);
    push_field(&mut lines, "load", host.load_avg.clone());
    for gpu in &host.gpus {
        let mut parts = vec![gpu.name.clone()];
        if !gpu.utilization.is_empty() {
            parts.push(gpu.utilization.clone());
        }
        if !gpu.temperature.is_empty() {
            parts.push(gpu.temperature.clone());
        }
        if !gpu.memory_used.is_empty() || !gpu.memory_total.is_empty() {
            parts.push(format!("{} / {}", gpu.memory_used, gpu.memory_total));
            // Vendors print mixed units; normalise to MiB for the percent.
            if let (Some(used), Some(total)) =
                (parse_mib(&gpu.memory_used), parse_mib(&gpu.memory_total))
            {
                if total > 0 {
                    parts.push(format!("({}%)", used * 100 / total));
                }
            }
        }
        push_field(&mut lines, &format!("gpu {}", gpu.index), parts.join("  "));
    }
    if let Some(queue) = &host.queue {
        let runner = if queue.runner_active { "active" } else { "absent" };
        let current = queue
            .current_job
            .map(|id| format!(", running job {id}"))
            .unwrap_or_default();
        let stop = if queue.stop_pending {
            ", stop pending"
        } else {
            ""
        };
        push_field(
            &mut lines,
            "queue",
            format!("runner {runner}, {} queued{current}{stop}", queue.depth),
        );
    }
    if host.last_check > 0 {
        push_field(&mut lines, "last check", host.last_check.to_string());
    }
    if let Some(err) = &host.error {
        lines.push(Line::from(Span::styled(
            format!("       error: {err}"),
            Style::default().fg(Color::Red),
        )));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

// --- overlays ---

fn render_flash(frame: &mut Frame, app: &App, area: Rect) {
    let Some(flash) = &app.flash else {
        let hint = Paragraph::new(" ?: help  n: new  s: sync  q: quit")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(hint, area);
        return;
    };
    let style = if flash.error {
        Style::default().fg(Color::White).bg(Color::Red)
    } else {
        Style::default().fg(Color::Black).bg(Color::Green)
    };
    frame.render_widget(
        Paragraph::new(format!(" {}", flash.text)).style(style),
        area,
    );
}

fn render_form(frame: &mut Frame, job_form: &form::JobForm, area: Rect) {
    let popup = centered_rect(area, 60, (form::FIELD_COUNT as u16) + 4);
    frame.render_widget(Clear, popup);

    let mut lines: Vec<Line> = Vec::new();
    for (i, label) in form::FIELD_LABELS.iter().enumerate() {
        let focused = i == job_form.focus;
        let marker = if focused { "> " } else { "  " };
        let value_style = if focused {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let cursor = if focused { "_" } else { "" };
        lines.push(Line::from(vec![
            Span::raw(marker),
            Span::styled(format!("{label:>12}: "), Style::default().fg(Color::DarkGray)),
            Span::styled(format!("{}{cursor}", job_form.fields[i]), value_style),
        ]));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "  Enter: launch   Tab: next field   Esc: cancel   (host@queue to enqueue)",
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" new job ")),
        popup,
    );
}

fn render_progress(frame: &mut Frame, title: &str, started: &std::time::Instant, area: Rect) {
    let popup = centered_rect(area, 40, 3);
    frame.render_widget(Clear, popup);
    let elapsed = started.elapsed().as_secs();
    frame.render_widget(
        Paragraph::new(format!("{title}… {elapsed}s"))
            .block(Block::default().borders(Borders::ALL)),
        popup,
    );
}

fn render_help(frame: &mut Frame, area: Rect) {
    let popup = centered_rect(area, 64, 22);
    frame.render_widget(Clear, popup);
    let text = "\
 ↑/↓        navigate          Tab   toggle details/logs
 h          hosts view        j     toggle jobs/hosts
 l          logs tab          f     cycle filter
 n          new job           R     edit + restart
 r          restart           k/Del kill running job
 x          delete row        P     prune finished
 S          start queue       g     start queued job now
 s          sync now          a     attach (tmux jobs)
 PgUp/PgDn  scroll logs       Home/End  jump in logs
 Esc        dismiss           q     quit
 Ctrl+Z     suspend

 hosts view: S start runner, d drain queue, u undo drain
 new job form: host or host@queue to enqueue";
    frame.render_widget(
        Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(" keys ")),
        popup,
    );
}

fn push_field(lines: &mut Vec<Line<'static>>, name: &str, value: String) {
    if value.is_empty() {
        return;
    }
    lines.push(Line::from(vec![
        Span::styled(
            format!("{name:>12}: "),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(value),
    ]));
}

// --- style helpers ---

fn status_style(status: JobStatus) -> Style {
    match status {
        JobStatus::Pending | JobStatus::Starting => Style::default().fg(Color::Cyan),
        JobStatus::Queued => Style::default().fg(Color::Yellow),
        JobStatus::Running => Style::default().fg(Color::Green),
        JobStatus::Completed => Style::default().fg(Color::Blue),
        JobStatus::Dead => Style::default().fg(Color::Red),
        JobStatus::Failed => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

fn host_status_style(status: HostStatus) -> Style {
    match status {
        HostStatus::Online => Style::default().fg(Color::Green),
        HostStatus::Offline => Style::default().fg(Color::Red),
        HostStatus::Checking => Style::default().fg(Color::Yellow),
        HostStatus::Unknown => Style::default().fg(Color::DarkGray),
    }
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
