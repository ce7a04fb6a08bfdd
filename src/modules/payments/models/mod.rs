mod payment;

pub use payment::AddPaymentRequest;
