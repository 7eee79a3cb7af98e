// Domain layer: 資料模型、請求 DTO 與對外介面 (ports)

pub mod model;
pub mod ports;
pub mod requests;
