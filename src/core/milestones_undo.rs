use crate::core::context::{join_delimited, parse_ids, ServiceContext, SUCCESS_CODE};
use crate::domain::model::{SqlParam, SqlType};
use crate::utils::error::Result;
use crate::utils::validation::{require_id, require_text};

const UNDO_PROCEDURE: &str = "prc_ISISMilestoneUndo";

pub struct MilestonesUndo {
    ctx: ServiceContext,
}

impl MilestonesUndo {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn can_undo(&self, milestone_id: i64) -> Result<bool> {
        require_id("milestone_id", milestone_id)?;
        let output = self
            .ctx
            .execute_non_query(
                "prc_ISISMilestoneUndoCheck",
                vec![
                    SqlParam::input("@MilestoneId", milestone_id),
                    SqlParam::output("@CanUndo", SqlType::Bit),
                ],
            )
            .await?;
        Ok(output.bit("@CanUndo"))
    }

    /// 撤銷成功且有後續里程碑時，一併撤銷相依紀錄
    pub async fn undo_milestone(&self, milestone_id: i64, worker_id: i64, reason: &str) -> Result<String> {
        require_id("milestone_id", milestone_id)?;
        require_id("worker_id", worker_id)?;
        require_text("reason", reason)?;
        self.undo_one(milestone_id, worker_id, reason.trim()).await
    }

    pub async fn undo_milestones(&self, milestone_ids: &str, worker_id: i64, reason: &str) -> Result<String> {
        require_id("worker_id", worker_id)?;
        require_text("reason", reason)?;
        let ids = parse_ids("milestone_ids", milestone_ids)?;

        let mut codes = Vec::with_capacity(ids.len());
        for id in ids {
            codes.push(self.undo_one(id, worker_id, reason.trim()).await?);
        }
        Ok(join_delimited(codes))
    }

    async fn undo_one(&self, milestone_id: i64, worker_id: i64, reason: &str) -> Result<String> {
        let output = self
            .ctx
            .execute_non_query(
                UNDO_PROCEDURE,
                vec![
                    SqlParam::input("@MilestoneId", milestone_id),
                    SqlParam::input("@WorkerId", worker_id),
                    SqlParam::input("@Reason", reason),
                    SqlParam::output("@ResultCode", SqlType::NVarChar(Some(10))),
                    SqlParam::output("@HasDependents", SqlType::Bit),
                ],
            )
            .await?;

        let code = output.require_text(UNDO_PROCEDURE, "@ResultCode")?;
        if code == SUCCESS_CODE && output.bit("@HasDependents") {
            tracing::info!(milestone_id, "Undoing dependent milestones");
            self.ctx
                .execute_non_query(
                    "prc_ISISMilestoneUndoDependents",
                    vec![
                        SqlParam::input("@MilestoneId", milestone_id),
                        SqlParam::input("@WorkerId", worker_id),
                    ],
                )
                .await?;
        }
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::*;
    use crate::domain::model::ProcedureOutput;
    use crate::domain::ports::MockDataAccess;
    use crate::utils::error::CaseError;
    use mockall::Sequence;

    #[tokio::test]
    async fn test_can_undo() {
        let mut data = MockDataAccess::new();
        data.expect_execute_non_query()
            .withf(|procedure, params| {
                procedure == "prc_ISISMilestoneUndoCheck" && has(params, "@MilestoneId", 70001i64)
            })
            .times(1)
            .returning(|_, _| Ok(ProcedureOutput::default().with_output("@CanUndo", true)));

        let service = MilestonesUndo::new(context(data, no_exceptions()));
        assert!(service.can_undo(70001).await.unwrap());
    }

    #[tokio::test]
    async fn test_can_undo_db_error() {
        let mut data = MockDataAccess::new();
        data.expect_execute_non_query()
            .times(1)
            .returning(|p, _| Err(db_error(p)));

        let service = MilestonesUndo::new(context(data, expect_web_exception_once()));
        assert!(service.can_undo(70001).await.is_err());
    }

    #[tokio::test]
    async fn test_undo_without_dependents_calls_once() {
        let mut data = MockDataAccess::new();
        data.expect_execute_non_query()
            .withf(|procedure, params| {
                procedure == "prc_ISISMilestoneUndo"
                    && has(params, "@MilestoneId", 70001i64)
                    && has(params, "@Reason", "Entered in error")
            })
            .times(1)
            .returning(|_, _| {
                Ok(ProcedureOutput::default()
                    .with_output("@ResultCode", "0")
                    .with_output("@HasDependents", false))
            });

        let service = MilestonesUndo::new(context(data, no_exceptions()));
        let code = service
            .undo_milestone(70001, 9, " Entered in error ")
            .await
            .unwrap();
        assert_eq!(code, "0");
    }

    #[tokio::test]
    async fn test_undo_with_dependents_cascades() {
        let mut data = MockDataAccess::new();
        let mut seq = Sequence::new();
        data.expect_execute_non_query()
            .withf(|procedure, _| procedure == "prc_ISISMilestoneUndo")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(ProcedureOutput::default()
                    .with_output("@ResultCode", "0")
                    .with_output("@HasDependents", true))
            });
        data.expect_execute_non_query()
            .withf(|procedure, params| {
                procedure == "prc_ISISMilestoneUndoDependents" && has(params, "@MilestoneId", 70001i64)
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(ProcedureOutput::default()));

        let service = MilestonesUndo::new(context(data, no_exceptions()));
        assert_eq!(service.undo_milestone(70001, 9, "Duplicate").await.unwrap(), "0");
    }

    #[tokio::test]
    async fn test_dependents_failure_after_undo_is_returned() {
        let mut data = MockDataAccess::new();
        let mut seq = Sequence::new();
        data.expect_execute_non_query()
            .withf(|procedure, _| procedure == "prc_ISISMilestoneUndo")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(ProcedureOutput::default()
                    .with_output("@ResultCode", "0")
                    .with_output("@HasDependents", true))
            });
        data.expect_execute_non_query()
            .withf(|procedure, _| procedure == "prc_ISISMilestoneUndoDependents")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|p, _| Err(db_error(p)));

        let service = MilestonesUndo::new(context(data, expect_web_exception_once()));
        let err = service.undo_milestone(70001, 9, "Duplicate").await.unwrap_err();
        assert!(matches!(
            err,
            CaseError::Database { ref procedure, .. } if procedure == "prc_ISISMilestoneUndoDependents"
        ));
    }

    #[tokio::test]
    async fn test_rejected_undo_does_not_cascade() {
        let mut data = MockDataAccess::new();
        data.expect_execute_non_query()
            .withf(|procedure, _| procedure == "prc_ISISMilestoneUndo")
            .times(1)
            .returning(|_, _| {
                Ok(ProcedureOutput::default()
                    .with_output("@ResultCode", "U03")
                    .with_output("@HasDependents", true))
            });

        let service = MilestonesUndo::new(context(data, no_exceptions()));
        assert_eq!(service.undo_milestone(70001, 9, "Duplicate").await.unwrap(), "U03");
    }

    #[tokio::test]
    async fn test_undo_milestone_db_error() {
        let mut data = MockDataAccess::new();
        data.expect_execute_non_query()
            .times(1)
            .returning(|p, _| Err(db_error(p)));

        let service = MilestonesUndo::new(context(data, expect_web_exception_once()));
        assert!(service.undo_milestone(70001, 9, "Duplicate").await.is_err());
    }

    #[tokio::test]
    async fn test_undo_milestones_calls_once_per_id() {
        let mut data = MockDataAccess::new();
        data.expect_execute_non_query()
            .withf(|procedure, _| procedure == "prc_ISISMilestoneUndo")
            .times(3)
            .returning(|_, _| {
                Ok(ProcedureOutput::default()
                    .with_output("@ResultCode", "0")
                    .with_output("@HasDependents", false))
            });

        let service = MilestonesUndo::new(context(data, no_exceptions()));
        let codes = service.undo_milestones("1|2|3", 9, "Cleanup").await.unwrap();
        assert_eq!(codes, "0|0|0");
    }

    #[tokio::test]
    async fn test_undo_milestones_requires_reason() {
        let service = MilestonesUndo::new(context(MockDataAccess::new(), no_exceptions()));
        assert!(matches!(
            service.undo_milestones("1|2", 9, "").await,
            Err(CaseError::Validation { .. })
        ));
    }
}
