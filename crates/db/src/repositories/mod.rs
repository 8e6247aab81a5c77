//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod equipment_repo;
pub mod maintenance_record_repo;
pub mod material_repo;
pub mod material_transaction_repo;
pub mod product_repo;
pub mod production_order_repo;
pub mod quality_inspection_repo;
pub mod quality_standard_repo;
pub mod session_repo;
pub mod user_repo;

pub use equipment_repo::EquipmentRepo;
pub use maintenance_record_repo::MaintenanceRecordRepo;
pub use material_repo::MaterialRepo;
pub use material_transaction_repo::MaterialTransactionRepo;
pub use product_repo::ProductRepo;
pub use production_order_repo::ProductionOrderRepo;
pub use quality_inspection_repo::QualityInspectionRepo;
pub use quality_standard_repo::QualityStandardRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;
