//! Slate exchange protocol driver
//!
//! A [`SlateExchange`] walks one draft through the interactive MimbleWimble
//! transaction building flow:
//!
//! ```text
//! Idle -> OpeningApp -> Preparing -> AwaitingResponse -> Finalizing -> Signed -> Broadcasting -> Broadcast
//! ```
//!
//! Every transition is published on a `watch` channel. The device is a
//! single occupancy resource: the [`SessionSlot`] closes any previous session
//! before a new one is recorded, and sessions are released on every exit
//! path. Broadcasting is the commit point; nothing that happens after it is
//! rolled back.

use crate::account::{add_sent_transaction_to_account, AccountRepository, Broadcaster};
use crate::config::WalletConfig;
use crate::error::{DeviceError, WalletError, WalletResult};
use crate::hardware::{
    DeviceProvider, DeviceSession, FinalizeRequest, PrepareRequest, PreparedSlate, SignedOperation,
};
use crate::response::{validate_transaction_response, ResponseError, ResponseValidation};
use crate::status::{compute_status, prepare_draft, select_inputs, TransactionStatus};
use crate::transaction::{Transaction, TransactionPatch};
use crate::types::{Account, Operation};
use crate::wallet_api::{RecipientError, WalletApi, SLATEPACK_VERSION};
use futures::{FutureExt, StreamExt};
use mwc_core::{classify, Currency, RecipientAddress};
use qrcode::{EcLevel, QrCode};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Called with device failures; returning `true` means the caller handled
/// the failure and the exchange must not enter [`ExchangeState::Failed`]
pub type FailureHandler = Arc<dyn Fn(&DeviceError) -> bool + Send + Sync>;

/// Position of a draft in the exchange
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeState {
    Idle,
    /// Waiting for the currency application to open on the device
    OpeningApp,
    /// Waiting for the device to build the sender's half of the slate
    Preparing,
    /// Slate handed to the user; waiting for the recipient's response
    AwaitingResponse(SlateRequest),
    /// Waiting for the device to sign using the response
    Finalizing,
    /// Signed and ready to broadcast; survives failed broadcasts
    Signed(SignedOperation),
    Broadcasting,
    Broadcast(Operation),
    /// A device failure ended the exchange
    Failed(DeviceError),
}

impl ExchangeState {
    pub fn name(&self) -> &'static str {
        match self {
            ExchangeState::Idle => "idle",
            ExchangeState::OpeningApp => "opening_app",
            ExchangeState::Preparing => "preparing",
            ExchangeState::AwaitingResponse(_) => "awaiting_response",
            ExchangeState::Finalizing => "finalizing",
            ExchangeState::Signed(_) => "signed",
            ExchangeState::Broadcasting => "broadcasting",
            ExchangeState::Broadcast(_) => "broadcast",
            ExchangeState::Failed(_) => "failed",
        }
    }
}

/// Slate to deliver to the recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlateRequest {
    pub payload: String,
    /// Text rendering of the payload as a QR code, absent when it does not fit
    pub qr_code: Option<String>,
}

impl SlateRequest {
    pub fn new(payload: String) -> Self {
        let qr_code = match QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::L) {
            Ok(code) => Some(
                code.render::<char>()
                    .quiet_zone(false)
                    .module_dimensions(2, 1)
                    .build(),
            ),
            Err(error) => {
                debug!(error = %error, length = payload.len(), "slate does not fit a QR code");
                None
            }
        };
        Self { payload, qr_code }
    }
}

/// Runs `future` and completes no sooner than `minimum` after the call
pub async fn exec_and_wait_at_least<F: Future>(minimum: Duration, future: F) -> F::Output {
    let (output, ()) = tokio::join!(future, tokio::time::sleep(minimum));
    output
}

struct ActiveSession {
    session: Arc<dyn DeviceSession>,
    token: CancellationToken,
}

/// Holds at most one open device session
#[derive(Default)]
pub struct SessionSlot {
    active: Mutex<Option<ActiveSession>>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a session with `device_id`, first cancelling and closing the
    /// session already held. The returned token is cancelled when the
    /// session is released or `parent` is cancelled.
    pub async fn acquire(
        &self,
        provider: &dyn DeviceProvider,
        device_id: &str,
        parent: &CancellationToken,
    ) -> Result<(Arc<dyn DeviceSession>, CancellationToken), DeviceError> {
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            debug!(device = previous.session.device_id(), "closing previous device session");
            previous.token.cancel();
            previous.session.close().await;
        }

        let session = provider.open(device_id).await?;
        let token = parent.child_token();
        *active = Some(ActiveSession {
            session: Arc::clone(&session),
            token: token.clone(),
        });
        Ok((session, token))
    }

    /// Cancels and closes the held session, if any
    pub async fn release(&self) {
        if let Some(previous) = self.active.lock().await.take() {
            previous.token.cancel();
            previous.session.close().await;
        }
    }

    pub async fn is_active(&self) -> bool {
        self.active.lock().await.is_some()
    }
}

impl Drop for SessionSlot {
    fn drop(&mut self) {
        if let Some(previous) = self.active.get_mut().take() {
            previous.token.cancel();
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                runtime.spawn(async move { previous.session.close().await });
            }
        }
    }
}

/// External services the exchange depends on
#[derive(Clone)]
pub struct Collaborators {
    pub devices: Arc<dyn DeviceProvider>,
    pub accounts: Arc<dyn AccountRepository>,
    pub broadcaster: Arc<dyn Broadcaster>,
}

/// Drives one draft through the slate exchange
pub struct SlateExchange {
    /// Wallet configuration
    config: WalletConfig,
    /// Device, account and network services
    collaborators: Collaborators,
    /// Account the draft spends from
    account_id: String,
    /// Physical device the sessions are bound to
    device_id: String,
    /// Draft being built
    draft: Transaction,
    /// Optional interception of device failures
    failure_handler: Option<FailureHandler>,
    /// Single device session of this flow
    session: SessionSlot,
    /// Cancels whatever device interaction is in flight
    flow: CancellationToken,
    /// Current state, observable through [`SlateExchange::subscribe`]
    state: watch::Sender<ExchangeState>,
}

impl SlateExchange {
    pub fn new(
        config: WalletConfig,
        collaborators: Collaborators,
        account_id: impl Into<String>,
        device_id: impl Into<String>,
        draft: Transaction,
    ) -> Self {
        let (state, _) = watch::channel(ExchangeState::Idle);
        Self {
            config,
            collaborators,
            account_id: account_id.into(),
            device_id: device_id.into(),
            draft,
            failure_handler: None,
            session: SessionSlot::new(),
            flow: CancellationToken::new(),
            state,
        }
    }

    #[must_use]
    pub fn with_failure_handler(mut self, handler: FailureHandler) -> Self {
        self.failure_handler = Some(handler);
        self
    }

    pub fn state(&self) -> ExchangeState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ExchangeState> {
        self.state.subscribe()
    }

    pub fn draft(&self) -> &Transaction {
        &self.draft
    }

    /// Token that aborts the step currently in flight. Once cancelled it is
    /// replaced when the next step starts, so take a new one for each step.
    pub fn canceller(&self) -> CancellationToken {
        self.flow.clone()
    }

    /// Edits the draft; only allowed before the exchange starts
    pub fn update_draft(&mut self, patch: TransactionPatch) -> WalletResult<()> {
        if !matches!(self.state(), ExchangeState::Idle) {
            return Err(self.invalid_state("edit the draft"));
        }
        self.draft = self.draft.apply(patch);
        Ok(())
    }

    /// Status of the draft against the current account snapshot
    pub async fn status(&self) -> WalletResult<TransactionStatus> {
        let account = self.account().await?;
        let runtime = self.config.runtime.profile;
        let draft = prepare_draft(&account, &self.draft, runtime);
        Ok(compute_status(&account, &draft, runtime))
    }

    /// Opens the currency application and has the device prepare the slate
    pub async fn start(&mut self) -> WalletResult<SlateRequest> {
        if !matches!(self.state(), ExchangeState::Idle) {
            return Err(self.invalid_state("start"));
        }
        self.renew_flow();

        let account = self.account().await?;
        let runtime = self.config.runtime.profile;
        let draft = prepare_draft(&account, &self.draft, runtime);
        let status = compute_status(&account, &draft, runtime);
        if let Some(problem) = status.errors.values().next() {
            return Err(WalletError::InvalidTransaction(problem.to_string()));
        }
        self.draft = draft;

        self.set_state(ExchangeState::OpeningApp);
        let token = match self.open_session(account.currency).await {
            Ok((_, token)) => token,
            Err(failure) => return Err(self.fail("open the application", failure, ExchangeState::Idle).await),
        };

        self.set_state(ExchangeState::Preparing);
        let request = PrepareRequest {
            currency: account.currency,
            transaction: self.draft.to_raw(),
            inputs: select_inputs(&account, &self.draft).inputs,
            resources: account.resources.to_raw(),
        };
        let prepared = self.receive_slate(request, &token).await;
        self.session.release().await;

        match prepared {
            Ok(slate) => {
                self.draft = self.draft.apply(TransactionPatch {
                    height: Some(Some(slate.height)),
                    id: Some(Some(slate.id)),
                    offset: Some(Some(slate.offset)),
                    proof: Some(slate.proof),
                    private_nonce_index: Some(Some(slate.private_nonce_index)),
                    ..TransactionPatch::default()
                });
                let request = SlateRequest::new(slate.transaction_data);
                info!(account = %self.account_id, transaction = %slate.id, "slate prepared");
                self.set_state(ExchangeState::AwaitingResponse(request.clone()));
                Ok(request)
            }
            Err(failure) => {
                report("prepare the transaction", &failure);
                self.set_state(ExchangeState::Idle);
                Err(failure)
            }
        }
    }

    /// Validates and records the recipient's response
    pub async fn submit_response(&mut self, response: &str) -> WalletResult<ResponseValidation> {
        if !matches!(self.state(), ExchangeState::AwaitingResponse(_)) {
            return Err(self.invalid_state("submit a response"));
        }

        let currency = self.account().await?.currency;
        let validation = validate_transaction_response(currency, &self.draft, response);
        if let Some(problem) = validation.error.clone() {
            return Err(WalletError::InvalidResponse(problem));
        }
        let response = response.trim();
        if response.is_empty() {
            return Err(WalletError::InvalidResponse(ResponseError::Empty));
        }

        self.draft = self.draft.apply(TransactionPatch {
            transaction_response: Some(Some(response.to_string())),
            ..TransactionPatch::default()
        });
        Ok(validation)
    }

    /// Delivers the slate to a recipient listening over HTTP and records the
    /// slate it returns. Failures leave the exchange waiting, so the response
    /// can still be supplied by hand.
    pub async fn request_response(&mut self, api: &WalletApi) -> WalletResult<ResponseValidation> {
        let ExchangeState::AwaitingResponse(request) = self.state() else {
            return Err(self.invalid_state("request a response"));
        };
        let currency = self.account().await?.currency;
        let url = match classify(currency, &self.draft.recipient) {
            RecipientAddress::Http(url) if !self.draft.send_as_file => url,
            _ => return Err(self.invalid_state("request a response from this recipient")),
        };
        self.renew_flow();

        let versions = until_cancelled(&self.flow, api.supported_slate_versions(&url)).await?;
        let slate = match serde_json::from_str::<Value>(&request.payload) {
            Ok(slate @ Value::Object(_)) => slate,
            _ if versions.iter().any(|version| version == SLATEPACK_VERSION) => {
                Value::String(request.payload.clone())
            }
            _ => {
                return Err(RecipientError::UnsupportedResponse(
                    "recipient doesn't accept slatepacks".to_string(),
                )
                .into())
            }
        };

        let returned = until_cancelled(&self.flow, api.receive_transaction(currency, &url, slate)).await?;
        let response = match returned {
            Value::String(text) => text,
            other => other.to_string(),
        };
        info!(account = %self.account_id, recipient = %url, "recipient returned a response");
        self.submit_response(&response).await
    }

    /// Has the device sign the transaction using the recorded response
    pub async fn finalize(&mut self) -> WalletResult<SignedOperation> {
        let waiting = self.state();
        if !matches!(waiting, ExchangeState::AwaitingResponse(_))
            || self.draft.transaction_response.is_none()
        {
            return Err(self.invalid_state("finalize"));
        }
        self.renew_flow();

        let account = self.account().await?;
        self.set_state(ExchangeState::Finalizing);
        let token = match self.open_session(account.currency).await {
            Ok((_, token)) => token,
            Err(failure) => return Err(self.fail("open the application", failure, waiting).await),
        };

        let request = FinalizeRequest {
            currency: account.currency,
            transaction: self.draft.to_raw(),
            inputs: select_inputs(&account, &self.draft).inputs,
            resources: account.resources.to_raw(),
        };
        let signed = self.sign(request, &token).await;
        self.session.release().await;

        match signed {
            Ok(signed) => {
                info!(account = %self.account_id, operation = %signed.operation.id, "transaction signed");
                self.set_state(ExchangeState::Signed(signed.clone()));
                Ok(signed)
            }
            Err(failure) => Err(self.fail("sign the transaction", failure, waiting).await),
        }
    }

    /// Submits the signed transaction and records it in the account.
    ///
    /// A failed broadcast leaves the exchange in `Signed` so it can be retried.
    /// Once the node accepted the transaction the exchange is `Broadcast` and
    /// this returns the operation even if recording it in the account fails;
    /// that failure is logged and the account catches up on its next sync.
    pub async fn broadcast(&mut self) -> WalletResult<Operation> {
        let ExchangeState::Signed(signed) = self.state() else {
            return Err(self.invalid_state("broadcast"));
        };

        let account = self.account().await?;
        self.set_state(ExchangeState::Broadcasting);
        let broadcaster = Arc::clone(&self.collaborators.broadcaster);
        let outcome = exec_and_wait_at_least(
            self.config.broadcast.minimum_duration(),
            broadcaster.broadcast(&account, &signed),
        )
        .await;

        let operation = match outcome {
            Ok(operation) => operation,
            Err(failure) => {
                error!(account = %self.account_id, error = %failure, "broadcast failed");
                self.set_state(ExchangeState::Signed(signed));
                return Err(failure);
            }
        };

        let recorded = SignedOperation {
            operation: operation.clone(),
            ..signed
        };
        self.set_state(ExchangeState::Broadcast(operation.clone()));
        let updated = self
            .collaborators
            .accounts
            .apply_updater(
                &self.account_id,
                Box::new(move |account| add_sent_transaction_to_account(account, &recorded)),
            )
            .await;
        if let Err(failure) = updated {
            error!(
                account = %self.account_id,
                operation = %operation.id,
                error = %failure,
                "failed to record broadcast transaction"
            );
        }
        Ok(operation)
    }

    /// Abandons the exchange: releases the device and forgets the slate.
    /// A broadcast transaction stays broadcast.
    pub async fn cancel(&mut self) {
        self.flow.cancel();
        self.flow = CancellationToken::new();
        self.session.release().await;
        if !matches!(self.state(), ExchangeState::Broadcast(_)) {
            self.draft = self.draft.cleared_exchange_state();
            self.set_state(ExchangeState::Idle);
        }
    }

    /// Returns a failed exchange to `Idle` so it can be retried
    pub async fn reset(&mut self) -> WalletResult<()> {
        if !matches!(self.state(), ExchangeState::Failed(_)) {
            return Err(self.invalid_state("reset"));
        }
        self.session.release().await;
        self.draft = self.draft.cleared_exchange_state();
        self.set_state(ExchangeState::Idle);
        Ok(())
    }

    fn renew_flow(&mut self) {
        if self.flow.is_cancelled() {
            self.flow = CancellationToken::new();
        }
    }

    async fn account(&self) -> WalletResult<Account> {
        self.collaborators.accounts.current_account(&self.account_id).await
    }

    async fn open_session(
        &self,
        currency: Currency,
    ) -> WalletResult<(Arc<dyn DeviceSession>, CancellationToken)> {
        let (session, token) = until_cancelled(
            &self.flow,
            self.session
                .acquire(self.collaborators.devices.as_ref(), &self.device_id, &self.flow),
        )
        .await?;
        let app_name = self.config.device.app_name(currency);
        until_cancelled(&token, session.open_app(&app_name)).await?;
        Ok((session, token))
    }

    async fn receive_slate(
        &self,
        request: PrepareRequest,
        token: &CancellationToken,
    ) -> WalletResult<PreparedSlate> {
        let session = self.active_session().await?;
        let mut updates = session.prepare_transaction(request);

        let next = tokio::select! {
            biased;
            () = token.cancelled() => return Err(WalletError::Cancelled),
            next = updates.next() => next,
        };
        let slate = match next {
            Some(Ok(slate)) => slate,
            Some(Err(failure)) => return Err(failure.into()),
            None => {
                return Err(DeviceError::InvalidResponse(
                    "preparation ended without a slate".to_string(),
                )
                .into())
            }
        };

        // Transaction data received; anything the channel still has queued is noise.
        while let Some(Some(trailing)) = updates.next().now_or_never() {
            match trailing {
                Err(failure) => {
                    debug!(error = %failure, "ignoring device error after the slate was received");
                }
                Ok(_) => debug!("ignoring repeated slate"),
            }
        }
        Ok(slate)
    }

    async fn sign(
        &self,
        request: FinalizeRequest,
        token: &CancellationToken,
    ) -> WalletResult<SignedOperation> {
        let session = self.active_session().await?;
        until_cancelled(token, session.finalize_transaction(request)).await
    }

    async fn active_session(&self) -> WalletResult<Arc<dyn DeviceSession>> {
        self.session
            .active
            .lock()
            .await
            .as_ref()
            .map(|active| Arc::clone(&active.session))
            .ok_or(WalletError::Cancelled)
    }

    /// Releases the device and settles the state after a failed device step
    async fn fail(
        &self,
        action: &'static str,
        failure: WalletError,
        fallback: ExchangeState,
    ) -> WalletError {
        self.session.release().await;
        report(action, &failure);
        match &failure {
            WalletError::Device(device_error) => {
                let intercepted = self
                    .failure_handler
                    .as_ref()
                    .is_some_and(|handler| handler(device_error));
                if intercepted {
                    self.set_state(fallback);
                } else {
                    self.set_state(ExchangeState::Failed(device_error.clone()));
                }
            }
            _ => self.set_state(fallback),
        }
        failure
    }

    fn set_state(&self, state: ExchangeState) {
        info!(account = %self.account_id, state = state.name(), "slate exchange state changed");
        self.state.send_replace(state);
    }

    fn invalid_state(&self, action: &'static str) -> WalletError {
        WalletError::InvalidState {
            action,
            state: self.state.borrow().name().to_string(),
        }
    }
}

async fn until_cancelled<T, E>(
    token: &CancellationToken,
    future: impl Future<Output = Result<T, E>>,
) -> WalletResult<T>
where
    WalletError: From<E>,
{
    tokio::select! {
        biased;
        () = token.cancelled() => Err(WalletError::Cancelled),
        result = future => result.map_err(WalletError::from),
    }
}

fn report(action: &'static str, failure: &WalletError) {
    if matches!(failure, WalletError::Cancelled) {
        info!(action, "device interaction cancelled");
    } else if failure.is_expected() {
        warn!(action, error = %failure, "device interaction did not complete");
    } else {
        error!(action, error = %failure, "device interaction failed");
    }
}
