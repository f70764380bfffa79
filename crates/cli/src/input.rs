// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Keyboard and mouse handling.

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use rj_core::JobStatus;

use crate::app::{App, DetailTab, Modal, View};
use crate::form::JobForm;
use crate::msg::Cmd;
use crate::ui;

pub fn handle_key(app: &mut App, key: KeyEvent) -> Vec<Cmd> {
    if key.kind == KeyEventKind::Release {
        return Vec::new();
    }

    // Ctrl+C quits from anywhere, Ctrl+Z suspends from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => {
                app.should_quit = true;
                return vec![Cmd::Quit];
            }
            KeyCode::Char('z') => return vec![Cmd::Suspend],
            _ => {}
        }
    }

    match &app.modal {
        Some(Modal::NewJob(_)) => handle_form_key(app, key),
        Some(Modal::Help) => {
            app.modal = None;
            Vec::new()
        }
        Some(Modal::Progress { .. }) => Vec::new(),
        None => handle_main_key(app, key),
    }
}

fn handle_main_key(app: &mut App, key: KeyEvent) -> Vec<Cmd> {
    match key.code {
        KeyCode::Up => {
            match app.view {
                View::Jobs => app.move_selection(-1),
                View::Hosts => app.move_host_selection(-1),
            }
            Vec::new()
        }
        KeyCode::Down => {
            match app.view {
                View::Jobs => app.move_selection(1),
                View::Hosts => app.move_host_selection(1),
            }
            Vec::new()
        }

        KeyCode::Tab => match app.view {
            View::Jobs => {
                app.tab = match app.tab {
                    DetailTab::Details => DetailTab::Logs,
                    DetailTab::Logs => DetailTab::Details,
                };
                Vec::new()
            }
            View::Hosts => {
                app.view = View::Jobs;
                Vec::new()
            }
        },

        KeyCode::Char('h') => {
            app.view = View::Hosts;
            // Show cached facts immediately, refresh in the background.
            app.update(crate::msg::Msg::HostTick)
        }
        KeyCode::Char('j') => {
            app.view = match app.view {
                View::Jobs => View::Hosts,
                View::Hosts => View::Jobs,
            };
            if app.view == View::Hosts {
                app.update(crate::msg::Msg::HostTick)
            } else {
                Vec::new()
            }
        }
        KeyCode::Char('l') => {
            if app.view == View::Jobs {
                app.tab = match app.tab {
                    DetailTab::Details => DetailTab::Logs,
                    DetailTab::Logs => DetailTab::Details,
                };
            }
            Vec::new()
        }

        KeyCode::Char('f') => {
            if app.view == View::Jobs {
                app.cycle_filter();
            }
            Vec::new()
        }

        KeyCode::Char('n') => {
            app.modal = Some(Modal::NewJob(JobForm::new()));
            Vec::new()
        }

        KeyCode::Char('r') => restart_selected(app, false),
        KeyCode::Char('R') => restart_selected(app, true),

        KeyCode::Char('k') | KeyCode::Delete => {
            let Some(job) = app.selected_job() else {
                return Vec::new();
            };
            if job.status != JobStatus::Running {
                app.set_flash("only running jobs can be killed", true);
                return Vec::new();
            }
            vec![Cmd::Kill { job_id: job.id }]
        }

        KeyCode::Char('x') => match app.selected_job() {
            Some(job) => vec![Cmd::Remove { job_id: job.id }],
            None => Vec::new(),
        },

        KeyCode::Char('P') => vec![Cmd::Prune],

        KeyCode::Char('S') => match app.view {
            View::Jobs => {
                let Some(job) = app.selected_job() else {
                    return Vec::new();
                };
                if job.status != JobStatus::Queued {
                    app.set_flash("select a queued job to start its queue", true);
                    return Vec::new();
                }
                vec![Cmd::StartQueue {
                    host: job.host.clone(),
                    queue: job.queue_name().to_string(),
                }]
            }
            View::Hosts => match app.current_host() {
                Some(host) => vec![Cmd::StartQueue {
                    host: host.name.clone(),
                    queue: rj_core::DEFAULT_QUEUE.to_string(),
                }],
                None => Vec::new(),
            },
        },

        KeyCode::Char('d') if app.view == View::Hosts => match app.current_host() {
            Some(host) => vec![Cmd::StopQueue {
                host: host.name.clone(),
                queue: rj_core::DEFAULT_QUEUE.to_string(),
            }],
            None => Vec::new(),
        },

        KeyCode::Char('u') if app.view == View::Hosts => match app.current_host() {
            Some(host) => vec![Cmd::CancelQueueStop {
                host: host.name.clone(),
                queue: rj_core::DEFAULT_QUEUE.to_string(),
            }],
            None => Vec::new(),
        },

        KeyCode::Char('g') => {
            let Some(job) = app.selected_job() else {
                return Vec::new();
            };
            if job.status != JobStatus::Queued {
                app.set_flash("only queued jobs can be started now", true);
                return Vec::new();
            }
            vec![Cmd::StartNow { job_id: job.id }]
        }

        KeyCode::Char('s') => {
            if app.syncing {
                return Vec::new();
            }
            app.syncing = true;
            vec![Cmd::Sync]
        }

        KeyCode::Char('a') => {
            let Some(job) = app.selected_job() else {
                return Vec::new();
            };
            if job.status == JobStatus::Running && job.session.is_some() {
                return vec![Cmd::Attach {
                    host: job.host.clone(),
                    session: job.tmux_session(),
                }];
            }
            app.set_flash("attach needs a running tmux job", true);
            Vec::new()
        }

        KeyCode::Char('?') => {
            app.modal = Some(Modal::Help);
            Vec::new()
        }

        KeyCode::Esc => {
            if app.modal.is_some() {
                app.modal = None;
            } else if app.flash.is_some() {
                app.flash = None;
            } else {
                app.select_job(None);
            }
            Vec::new()
        }

        KeyCode::Char('q') => {
            app.should_quit = true;
            vec![Cmd::Quit]
        }

        KeyCode::PageUp | KeyCode::PageDown | KeyCode::Home | KeyCode::End => {
            if app.view == View::Jobs && app.tab == DetailTab::Logs {
                scroll_log(app, key.code);
            }
            Vec::new()
        }

        _ => Vec::new(),
    }
}

fn restart_selected(app: &mut App, edit_first: bool) -> Vec<Cmd> {
    let Some(job) = app.selected_job() else {
        return Vec::new();
    };
    if edit_first {
        app.modal = Some(Modal::NewJob(JobForm::prefill(job)));
        return Vec::new();
    }
    if app.restarting {
        return Vec::new();
    }
    let job_id = job.id;
    app.restarting = true;
    app.modal = Some(Modal::Progress {
        title: format!("Restarting job {job_id}"),
        started: std::time::Instant::now(),
    });
    vec![Cmd::Restart { job_id }]
}

fn handle_form_key(app: &mut App, key: KeyEvent) -> Vec<Cmd> {
    let Some(Modal::NewJob(form)) = &mut app.modal else {
        return Vec::new();
    };
    match key.code {
        KeyCode::Esc => {
            app.modal = None;
            Vec::new()
        }
        KeyCode::Tab | KeyCode::Down => {
            form.next_field();
            Vec::new()
        }
        KeyCode::BackTab | KeyCode::Up => {
            form.prev_field();
            Vec::new()
        }
        KeyCode::Backspace => {
            form.backspace();
            Vec::new()
        }
        KeyCode::Enter => {
            let spec = form.to_spec();
            let queued = form.is_queued();
            let Some(spec) = spec else {
                app.set_flash("host and command are required", true);
                return Vec::new();
            };
            if app.creating_job {
                return Vec::new();
            }
            app.creating_job = true;
            app.modal = Some(Modal::Progress {
                title: format!("Launching on {}", spec.host),
                started: std::time::Instant::now(),
            });
            if queued {
                vec![Cmd::Enqueue(spec)]
            } else {
                vec![Cmd::Create(spec)]
            }
        }
        KeyCode::Char(c) => {
            form.push(c);
            Vec::new()
        }
        _ => Vec::new(),
    }
}

fn scroll_log(app: &mut App, code: KeyCode) {
    let page = ui::log_page_size(app);
    let max = app.log.lines.len();
    match code {
        KeyCode::PageUp => {
            app.log.offset = app.log.offset.saturating_sub(page);
            app.log.follow = false;
        }
        KeyCode::PageDown => {
            app.log.offset = (app.log.offset + page).min(max);
            if app.log.offset >= max {
                app.log.follow = true;
            }
        }
        KeyCode::Home => {
            app.log.offset = 0;
            app.log.follow = false;
        }
        KeyCode::End => {
            app.log.offset = max;
            app.log.follow = true;
        }
        _ => {}
    }
}

pub fn handle_mouse(app: &mut App, mouse: MouseEvent) -> Vec<Cmd> {
    if app.modal.is_some() {
        return Vec::new();
    }
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            match app.view {
                View::Jobs => {
                    if let Some(id) = ui::job_row_at(app, mouse.row) {
                        app.select_job(Some(id));
                    }
                }
                View::Hosts => {
                    if let Some(index) = ui::host_row_at(app, mouse.row) {
                        app.selected_host = index;
                    }
                }
            }
            Vec::new()
        }
        MouseEventKind::ScrollUp => {
            if app.view == View::Jobs && app.tab == DetailTab::Logs {
                app.log.offset = app.log.offset.saturating_sub(3);
                app.log.follow = false;
            }
            Vec::new()
        }
        MouseEventKind::ScrollDown => {
            if app.view == View::Jobs && app.tab == DetailTab::Logs {
                let max = app.log.lines.len();
                app.log.offset = (app.log.offset + 3).min(max);
                if app.log.offset >= max {
                    app.log.follow = true;
                }
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}
