use crate::core::context::{ServiceContext, SUCCESS_CODE};
use crate::domain::model::{DataTable, SqlParam, SqlType};
use crate::domain::ports::ExceptionPolicy;
use crate::utils::error::{CaseError, Result};
use crate::utils::validation::{require_id, require_text};
use serde::Serialize;
use std::fmt;

const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginOutcome {
    pub result_code: String,
    pub worker_id: Option<i64>,
    pub session_id: Option<String>,
}

impl LoginOutcome {
    pub fn is_authenticated(&self) -> bool {
        self.result_code == SUCCESS_CODE && self.worker_id.is_some()
    }
}

/// 畫面端使用的 "ResultCode|WorkerId" 格式
impl fmt::Display for LoginOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.worker_id {
            Some(id) => write!(f, "{}|{}", self.result_code, id),
            None => write!(f, "{}|", self.result_code),
        }
    }
}

pub struct LoginService {
    ctx: ServiceContext,
}

impl LoginService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn authenticate(
        &self,
        user_name: &str,
        password: &str,
        client_address: &str,
    ) -> Result<LoginOutcome> {
        require_text("user_name", user_name)?;
        require_text("password", password)?;

        const PROCEDURE: &str = "prc_ISISSecurityAuthenticate";
        let output = self
            .ctx
            .execute_non_query(
                PROCEDURE,
                vec![
                    SqlParam::input("@UserName", user_name.trim()),
                    SqlParam::input("@Password", password).sensitive(),
                    SqlParam::input("@ClientAddress", client_address),
                    SqlParam::output("@WorkerId", SqlType::BigInt),
                    SqlParam::output("@ResultCode", SqlType::NVarChar(Some(10))),
                    SqlParam::output("@SessionId", SqlType::NVarChar(Some(50))),
                ],
            )
            .await?;

        let outcome = LoginOutcome {
            result_code: output.require_text(PROCEDURE, "@ResultCode")?,
            worker_id: output.int("@WorkerId"),
            session_id: output.text("@SessionId"),
        };

        if outcome.result_code != SUCCESS_CODE {
            // 登入失敗留下稽核紀錄，呼叫端仍拿到結果碼
            self.ctx.exception_handler().log_exception(
                &CaseError::AccessDenied {
                    user_name: user_name.trim().to_string(),
                    result_code: outcome.result_code.clone(),
                },
                ExceptionPolicy::AuditException,
            );
        } else {
            tracing::info!(worker_id = ?outcome.worker_id, "User authenticated");
        }

        Ok(outcome)
    }

    pub async fn get_worker_roles(&self, worker_id: i64) -> Result<DataTable> {
        require_id("worker_id", worker_id)?;
        self.ctx
            .get_data_table(
                "prc_ISISSecurityRolesGet",
                vec![SqlParam::input("@WorkerId", worker_id)],
            )
            .await
    }

    pub async fn change_password(
        &self,
        user_name: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<String> {
        require_text("user_name", user_name)?;
        require_text("old_password", old_password)?;
        if new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(CaseError::validation(
                "new_password",
                format!("must be at least {} characters", MIN_PASSWORD_LENGTH),
            ));
        }
        if new_password == old_password {
            return Err(CaseError::validation(
                "new_password",
                "must differ from the current password",
            ));
        }

        const PROCEDURE: &str = "prc_ISISSecurityPasswordChange";
        let output = self
            .ctx
            .execute_non_query(
                PROCEDURE,
                vec![
                    SqlParam::input("@UserName", user_name.trim()),
                    SqlParam::input("@OldPassword", old_password).sensitive(),
                    SqlParam::input("@NewPassword", new_password).sensitive(),
                    SqlParam::output("@ResultCode", SqlType::NVarChar(Some(10))),
                ],
            )
            .await?;

        output.require_text(PROCEDURE, "@ResultCode")
    }

    pub async fn log_out(&self, session_id: &str) -> Result<()> {
        require_text("session_id", session_id)?;
        self.ctx
            .execute_non_query(
                "prc_ISISSecurityLogout",
                vec![SqlParam::input("@SessionId", session_id)],
            )
            .await?;
        Ok(())
    }
}
