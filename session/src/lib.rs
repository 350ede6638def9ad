//! Confirmation and lifecycle for an autorun prompt.
//!
//! One session per invocation: present the mount to the user, wait for their
//! decision while watching the mount's removal notification, and on approval
//! resolve and launch the medium's autorun program. The mount disappearing at
//! any point before the decision wins over the decision and tears the prompt
//! down.

mod error;
pub mod exec;

pub use error::SessionError;
pub use exec::{ExecError, Executor, ProcessExecutor};

use autorun_mount::{MountHandle, UnmountSubscription};
use autorun_resolver::resolve;
use std::future::Future;

/// The user's answer to the confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Cancelled,
}

/// What the presentation layer needs to phrase the prompt.
#[derive(Debug, Clone, Copy)]
pub struct PromptRequest<'a> {
    pub mount_name: &'a str,
    pub icon_name: Option<&'a str>,
}

/// Presentation collaborator. `confirm` is modal: at most one outstanding
/// prompt, and no other session event is processed while its handler runs.
pub trait Prompt {
    fn confirm(&mut self, request: PromptRequest<'_>) -> impl Future<Output = Decision>;

    /// Close an outstanding prompt without an answer (the mount went away).
    fn dismiss(&mut self);

    /// Terminal error surface shown to the user.
    fn show_error(&mut self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingConsent,
    Approved,
    Unmounted,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Approved,
    Cancelled,
    Unmounted,
}

/// How a session ended. `Launched` is only observable with an executor that
/// does not replace the process, such as a test double.
#[derive(Debug)]
pub enum SessionOutcome {
    Launched,
    Cancelled,
    Unmounted,
    Failed(SessionError),
}

/// The consent state machine. Owns the removal subscription and releases it
/// exactly once, on the first transition out of `AwaitingConsent`.
pub struct Session {
    state: SessionState,
    subscription: UnmountSubscription,
}

impl Session {
    pub fn new(mount: &MountHandle) -> Self {
        Self {
            state: SessionState::AwaitingConsent,
            subscription: mount.subscribe_unmount(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn subscription_released(&self) -> bool {
        self.subscription.is_released()
    }

    /// Apply one event. Events arriving in a terminal state are ignored; the
    /// subscription was already released by then.
    pub fn handle_event(&mut self, event: SessionEvent) -> SessionState {
        match (self.state, event) {
            (SessionState::AwaitingConsent, SessionEvent::Approved) => {
                self.transition(SessionState::Approved);
            }
            (SessionState::AwaitingConsent, SessionEvent::Cancelled) => {
                self.transition(SessionState::Terminated);
            }
            (SessionState::AwaitingConsent, SessionEvent::Unmounted) => {
                self.transition(SessionState::Unmounted);
            }
            (state, event) => {
                tracing::debug!("Ignoring {:?} in terminal state {:?}", event, state);
            }
        }
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!("Session {:?} -> {:?}", self.state, next);
        self.subscription.release();
        self.state = next;
    }
}

/// Drive one confirmation session to completion.
///
/// Blocks (cooperatively) on whichever arrives first: the user's decision or
/// the mount's removal. When both are ready on the same dispatcher turn,
/// removal wins and nothing is executed. The resolver runs only on the
/// approved path, never before the prompt.
pub async fn run<P, E>(mount: &MountHandle, prompt: &mut P, executor: &mut E) -> SessionOutcome
where
    P: Prompt,
    E: Executor,
{
    let mut session = Session::new(mount);

    let event = {
        let request = PromptRequest {
            mount_name: mount.display_name(),
            icon_name: mount.icon_name(),
        };
        let confirm = prompt.confirm(request);
        tokio::pin!(confirm);

        tokio::select! {
            biased;
            _ = session.subscription.unmounted() => SessionEvent::Unmounted,
            decision = &mut confirm => match decision {
                Decision::Approved => SessionEvent::Approved,
                Decision::Cancelled => SessionEvent::Cancelled,
            },
        }
    };

    session.handle_event(event);

    match event {
        SessionEvent::Unmounted => {
            tracing::info!("Mount removed while awaiting consent, dismissing prompt");
            prompt.dismiss();
            SessionOutcome::Unmounted
        }
        SessionEvent::Cancelled => {
            tracing::info!("User declined to run the program");
            SessionOutcome::Cancelled
        }
        SessionEvent::Approved => match resolve(mount.root()) {
            None => {
                tracing::warn!("No autorun program found under {:?}", mount.root());
                prompt.show_error("Unable to locate the program");
                SessionOutcome::Failed(SessionError::ProgramNotFound)
            }
            Some(candidate) => match executor.execute(&candidate) {
                Ok(()) => SessionOutcome::Launched,
                Err(err) => {
                    tracing::error!("Failed to start {:?}: {}", candidate.program, err);
                    prompt.show_error(&format!("Unable to start the program:\n{}", err));
                    SessionOutcome::Failed(SessionError::Exec(err))
                }
            },
        },
    }
}
