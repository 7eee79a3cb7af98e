pub mod cashout;
pub mod code_tables;
pub mod context;
pub mod invoice;
pub mod login;
pub mod milestones_save;
pub mod milestones_undo;
pub mod program_request;
pub mod reference;
pub mod service_plan;
pub mod service_span;

#[cfg(test)]
pub(crate) mod test_support;

pub use context::ServiceContext;

use crate::domain::ports::{DataAccess, ExceptionHandling};
use std::sync::Arc;

/// 所有業務服務，共用同一組資料存取與例外記錄
pub struct CaseServices {
    pub login: login::LoginService,
    pub cashout: cashout::CashoutService,
    pub code_tables: code_tables::CodeTables,
    pub invoice: invoice::InvoiceService,
    pub milestones_save: milestones_save::MilestonesSave,
    pub milestones_undo: milestones_undo::MilestonesUndo,
    pub program_request: program_request::ProgramRequestService,
    pub service_plan: service_plan::ServicePlanService,
    pub service_span: service_span::ServiceSpanService,
    pub reference: reference::ReferenceService,
}

impl CaseServices {
    pub fn new(data: Arc<dyn DataAccess>, errors: Arc<dyn ExceptionHandling>) -> Self {
        Self::from_context(ServiceContext::new(data, errors))
    }

    pub fn from_context(ctx: ServiceContext) -> Self {
        Self {
            login: login::LoginService::new(ctx.clone()),
            cashout: cashout::CashoutService::new(ctx.clone()),
            code_tables: code_tables::CodeTables::new(ctx.clone()),
            invoice: invoice::InvoiceService::new(ctx.clone()),
            milestones_save: milestones_save::MilestonesSave::new(ctx.clone()),
            milestones_undo: milestones_undo::MilestonesUndo::new(ctx.clone()),
            program_request: program_request::ProgramRequestService::new(ctx.clone()),
            service_plan: service_plan::ServicePlanService::new(ctx.clone()),
            service_span: service_span::ServiceSpanService::new(ctx.clone()),
            reference: reference::ReferenceService::new(ctx),
        }
    }
}
