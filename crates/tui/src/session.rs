//! Background access-token renewal.
//!
//! At most one renewal task exists per [`RenewalScheduler`]: scheduling
//! again or cancelling aborts the pending one. A failed renewal is reported
//! once and the task stops.

use std::{future::Future, sync::Arc};

use engine::token;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::client::{Client, ClientError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenewalEvent {
    /// New access token, already valid.
    Renewed(String),
    /// Renewal failed; no further attempt is scheduled.
    Failed(String),
}

/// Exchanges a refresh token for a fresh access token.
pub trait TokenRenewer: Send + Sync + 'static {
    fn renew(&self, refresh_token: &str)
    -> impl Future<Output = Result<String, ClientError>> + Send;
}

impl TokenRenewer for Client {
    async fn renew(&self, refresh_token: &str) -> Result<String, ClientError> {
        self.refresh(refresh_token).await
    }
}

pub struct RenewalScheduler<R> {
    renewer: Arc<R>,
    events: mpsc::UnboundedSender<RenewalEvent>,
    task: Option<JoinHandle<()>>,
}

impl<R: TokenRenewer> RenewalScheduler<R> {
    pub fn new(renewer: R) -> (Self, mpsc::UnboundedReceiver<RenewalEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            renewer: Arc::new(renewer),
            events,
            task: None,
        };
        (scheduler, rx)
    }

    /// Replaces the pending renewal with one derived from `access_token`.
    ///
    /// Returns `false`, leaving nothing scheduled, when the token carries no
    /// readable expiry or there is no refresh token.
    pub fn schedule(&mut self, access_token: &str, refresh_token: &str) -> bool {
        self.cancel();

        let Some(expiry_ms) = token::decode_expiry(access_token) else {
            tracing::debug!("token has no readable expiry, renewal not scheduled");
            return false;
        };
        if refresh_token.trim().is_empty() {
            tracing::debug!("no refresh token, renewal not scheduled");
            return false;
        }

        let renewer = Arc::clone(&self.renewer);
        let events = self.events.clone();
        let refresh_token = refresh_token.trim().to_string();
        self.task = Some(tokio::spawn(async move {
            let mut expiry_ms = expiry_ms;
            loop {
                let delay = token::renewal_delay(expiry_ms, token::now_ms());
                tracing::debug!("token renewal in {}s", delay.as_secs());
                tokio::time::sleep(delay).await;

                match renewer.renew(&refresh_token).await {
                    Ok(access_token) => {
                        let next = token::decode_expiry(&access_token);
                        tracing::info!("access token renewed");
                        if events.send(RenewalEvent::Renewed(access_token)).is_err() {
                            break;
                        }
                        match next {
                            Some(next) => expiry_ms = next,
                            None => break,
                        }
                    }
                    Err(err) => {
                        tracing::warn!("token renewal failed: {err}");
                        let _ = events.send(RenewalEvent::Failed(err.user_message()));
                        break;
                    }
                }
            }
        }));
        true
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl<R> Drop for RenewalScheduler<R> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

    use super::*;

    #[derive(Default)]
    struct FakeRenewer {
        calls: Arc<AtomicUsize>,
        answers: Mutex<VecDeque<Result<String, ClientError>>>,
    }

    impl TokenRenewer for FakeRenewer {
        async fn renew(&self, refresh_token: &str) -> Result<String, ClientError> {
            assert_eq!(refresh_token, "refresh");
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ClientError::EmptyToken))
        }
    }

    fn token_expiring_in(secs: i64) -> String {
        let exp = token::now_ms() / 1000 + secs;
        let claims = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp}}}"#));
        format!("header.{claims}.signature")
    }

    fn renewer(answers: Vec<Result<String, ClientError>>) -> (FakeRenewer, Arc<AtomicUsize>) {
        let fake = FakeRenewer {
            answers: Mutex::new(answers.into()),
            ..FakeRenewer::default()
        };
        let calls = Arc::clone(&fake.calls);
        (fake, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn fires_at_the_floor_for_short_lived_tokens() {
        let (fake, calls) = renewer(vec![Ok("opaque".to_string())]);
        let (mut scheduler, mut rx) = RenewalScheduler::new(fake);

        assert!(scheduler.schedule(&token_expiring_in(60), "refresh"));
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            rx.try_recv().unwrap(),
            RenewalEvent::Renewed("opaque".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_renewing_while_tokens_carry_an_expiry() {
        let next = token_expiring_in(600);
        let (fake, calls) = renewer(vec![Ok(next.clone()), Ok("last".to_string())]);
        let (mut scheduler, mut rx) = RenewalScheduler::new(fake);

        assert!(scheduler.schedule(&token_expiring_in(60), "refresh"));
        assert_eq!(rx.recv().await, Some(RenewalEvent::Renewed(next)));
        assert_eq!(rx.recv().await, Some(RenewalEvent::Renewed("last".to_string())));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_is_reported_once_and_stops() {
        let (fake, calls) = renewer(vec![Err(ClientError::Unauthorized)]);
        let (mut scheduler, mut rx) = RenewalScheduler::new(fake);

        assert!(scheduler.schedule(&token_expiring_in(60), "refresh"));
        assert_eq!(
            rx.recv().await,
            Some(RenewalEvent::Failed(
                "Credenciais inválidas ou expiradas.".to_string()
            ))
        );

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_scheduled());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_aborts_the_pending_task() {
        let (fake, calls) = renewer(vec![Ok("opaque".to_string())]);
        let (mut scheduler, _rx) = RenewalScheduler::new(fake);

        assert!(scheduler.schedule(&token_expiring_in(60), "refresh"));
        assert!(scheduler.schedule(&token_expiring_in(600), "refresh"));
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(scheduler.is_scheduled());

        scheduler.cancel();
        assert!(!scheduler.is_scheduled());
    }

    #[tokio::test]
    async fn nothing_scheduled_without_expiry_or_refresh_token() {
        let (fake, _calls) = renewer(Vec::new());
        let (mut scheduler, _rx) = RenewalScheduler::new(fake);

        assert!(!scheduler.schedule("not-a-jwt", "refresh"));
        assert!(!scheduler.schedule(&token_expiring_in(600), " "));
        assert!(!scheduler.is_scheduled());
    }
}
