//! Transaction model
//!
//! Represents a single payment attempt observed by the agent.
//!
//! CRITICAL: a `Transaction` is an immutable record. Once ingested it is
//! never mutated; it only ever moves through the Observer's sliding window
//! and is evicted, unaltered, when it ages out.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle status of a payment transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Success,
    Failed,
    Pending,
    Retry,
}

/// Payment method used for the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Upi,
    NetBanking,
    Wallet,
}

impl PaymentMethod {
    /// Stable wire/display tag, e.g. `"credit_card"`.
    pub fn as_tag(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::NetBanking => "net_banking",
            PaymentMethod::Wallet => "wallet",
        }
    }
}

/// A monetary amount tagged with its currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Money {
    pub amount: Decimal,
    pub currency: String,
}

/// Errors rejected at the ingestion boundary (`InputInvalid`, original §7).
#[derive(Debug, Error, PartialEq)]
pub enum TransactionError {
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    #[error("latency_ms must be non-negative, got {0}")]
    NegativeLatency(f64),

    #[error("latency_ms must be finite, got {0}")]
    NonFiniteLatency(f64),

    #[error("retry_count must be non-negative")]
    NegativeRetryCount,

    #[error("currency code must not be empty")]
    EmptyCurrency,
}

/// Immutable record of one payment transaction.
///
/// # Example
/// ```
/// use chrono::Utc;
/// use rust_decimal_macros::dec;
/// use payment_agent_core::model::transaction::{Money, PaymentMethod, Transaction, TransactionStatus};
///
/// let txn = Transaction::builder(
///     "txn_1",
///     Utc::now(),
///     Money { amount: dec!(100.00), currency: "USD".into() },
///     PaymentMethod::CreditCard,
///     "HDFC",
///     "merchant_1",
///     TransactionStatus::Success,
/// )
/// .latency_ms(120.0)
/// .build()
/// .unwrap();
///
/// assert_eq!(txn.issuer(), "HDFC");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    id: String,
    timestamp: DateTime<Utc>,
    amount: Money,
    payment_method: PaymentMethod,
    issuer: String,
    merchant_id: String,
    status: TransactionStatus,
    error_code: Option<String>,
    error_message: Option<String>,
    latency_ms: f64,
    retry_count: u32,
    is_retry: bool,
    original_transaction_id: Option<String>,
    region: String,
    processor: String,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn builder(
        id: impl Into<String>,
        timestamp: DateTime<Utc>,
        amount: Money,
        payment_method: PaymentMethod,
        issuer: impl Into<String>,
        merchant_id: impl Into<String>,
        status: TransactionStatus,
    ) -> TransactionBuilder {
        TransactionBuilder {
            id: id.into(),
            timestamp,
            amount,
            payment_method,
            issuer: issuer.into(),
            merchant_id: merchant_id.into(),
            status,
            error_code: None,
            error_message: None,
            latency_ms: 0.0,
            retry_count: 0,
            is_retry: false,
            original_transaction_id: None,
            region: "unknown".to_string(),
            processor: "default".to_string(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn amount(&self) -> &Money {
        &self.amount
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn latency_ms(&self) -> f64 {
        self.latency_ms
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn is_retry(&self) -> bool {
        self.is_retry
    }

    /// The transaction this one retries, falling back to its own id — the
    /// original always has one chain to be keyed by, itself.
    pub fn retry_chain_key(&self) -> &str {
        self.original_transaction_id
            .as_deref()
            .unwrap_or(&self.id)
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn processor(&self) -> &str {
        &self.processor
    }
}

/// Builder enforcing the ingestion-boundary invariants before a
/// [`Transaction`] can exist.
pub struct TransactionBuilder {
    id: String,
    timestamp: DateTime<Utc>,
    amount: Money,
    payment_method: PaymentMethod,
    issuer: String,
    merchant_id: String,
    status: TransactionStatus,
    error_code: Option<String>,
    error_message: Option<String>,
    latency_ms: f64,
    retry_count: u32,
    is_retry: bool,
    original_transaction_id: Option<String>,
    region: String,
    processor: String,
}

impl TransactionBuilder {
    pub fn error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn latency_ms(mut self, latency_ms: f64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn is_retry(mut self, is_retry: bool) -> Self {
        self.is_retry = is_retry;
        self
    }

    pub fn original_transaction_id(mut self, id: impl Into<String>) -> Self {
        self.original_transaction_id = Some(id.into());
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn processor(mut self, processor: impl Into<String>) -> Self {
        self.processor = processor.into();
        self
    }

    pub fn build(self) -> Result<Transaction, TransactionError> {
        if self.amount.amount <= Decimal::ZERO {
            return Err(TransactionError::NonPositiveAmount(self.amount.amount));
        }
        if self.amount.currency.trim().is_empty() {
            return Err(TransactionError::EmptyCurrency);
        }
        if !self.latency_ms.is_finite() {
            return Err(TransactionError::NonFiniteLatency(self.latency_ms));
        }
        if self.latency_ms < 0.0 {
            return Err(TransactionError::NegativeLatency(self.latency_ms));
        }

        Ok(Transaction {
            id: self.id,
            timestamp: self.timestamp,
            amount: self.amount,
            payment_method: self.payment_method,
            issuer: self.issuer,
            merchant_id: self.merchant_id,
            status: self.status,
            error_code: self.error_code,
            error_message: self.error_message,
            latency_ms: self.latency_ms,
            retry_count: self.retry_count,
            is_retry: self.is_retry,
            original_transaction_id: self.original_transaction_id,
            region: self.region,
            processor: self.processor,
        })
    }
}
