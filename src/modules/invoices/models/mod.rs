mod invoice;

pub use invoice::{
    BusinessSnapshot, CustomerSnapshot, GenerateInvoiceRequest, Invoice, InvoiceLineItem,
    InvoicePaymentView, InvoiceResponse, InvoiceStatus, UpdateTermsRequest,
};
