pub mod mercadopago;
pub mod notifications;
