//! 酒店生命周期状态机
//!
//! 纯逻辑模块：给定当前状态和动作，判定这次流转是否合法，并描述
//! 它产生的全部效果（目标状态、需要清理/写入的字段、审计动作、
//! 推送事件）。数据库写入和消息推送由调用方执行，这里不做任何 I/O。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// 酒店生命周期状态
///
/// 对外（API、数据库）一律使用大写 token；历史原型里出现过小写
/// 变体，统一在 [`HotelStatus::parse`] 入口归一化。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "hotel_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HotelStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
    Published,
    Offline,
}

impl HotelStatus {
    pub const ALL: [HotelStatus; 6] = [
        HotelStatus::Draft,
        HotelStatus::Submitted,
        HotelStatus::Approved,
        HotelStatus::Rejected,
        HotelStatus::Published,
        HotelStatus::Offline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HotelStatus::Draft => "DRAFT",
            HotelStatus::Submitted => "SUBMITTED",
            HotelStatus::Approved => "APPROVED",
            HotelStatus::Rejected => "REJECTED",
            HotelStatus::Published => "PUBLISHED",
            HotelStatus::Offline => "OFFLINE",
        }
    }

    /// 解析状态 token，兼容历史小写写法
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DRAFT" => Some(HotelStatus::Draft),
            "SUBMITTED" => Some(HotelStatus::Submitted),
            "APPROVED" => Some(HotelStatus::Approved),
            "REJECTED" => Some(HotelStatus::Rejected),
            "PUBLISHED" => Some(HotelStatus::Published),
            "OFFLINE" => Some(HotelStatus::Offline),
            _ => None,
        }
    }
}

impl fmt::Display for HotelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 用户角色，注册时确定且不可变更
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Merchant,
    Admin,
}

/// 审计日志动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "audit_action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Submit,
    Approve,
    Reject,
    Publish,
    Offline,
    Restore,
}

/// 状态机动作（create 不在此列：它没有前置状态）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Update,
    Submit,
    Approve,
    Reject,
    Publish,
    Offline,
    Restore,
}

impl LifecycleAction {
    pub const ALL: [LifecycleAction; 7] = [
        LifecycleAction::Update,
        LifecycleAction::Submit,
        LifecycleAction::Approve,
        LifecycleAction::Reject,
        LifecycleAction::Publish,
        LifecycleAction::Offline,
        LifecycleAction::Restore,
    ];
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleAction::Update => "编辑",
            LifecycleAction::Submit => "提交审核",
            LifecycleAction::Approve => "审核通过",
            LifecycleAction::Reject => "审核驳回",
            LifecycleAction::Publish => "发布",
            LifecycleAction::Offline => "下线",
            LifecycleAction::Restore => "恢复",
        };
        f.write_str(s)
    }
}

/// 一次合法流转的完整效果描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// 目标状态（Update 保持原状态不变）
    pub to: HotelStatus,
    /// 写入审计日志的动作
    pub audit: AuditAction,
    /// 推送事件名
    pub event: &'static str,
    /// true 推送到管理员房间，false 推送到所属商户房间
    pub to_admin_room: bool,
    /// 写入驳回原因（仅 Reject）
    pub sets_reject_reason: bool,
    /// 清空驳回原因
    pub clears_reject_reason: bool,
    /// 首次发布时写入 published_at（已有值则保留）
    pub stamps_published_at: bool,
    /// 记录下线前状态并写入 offline_at
    pub marks_offline: bool,
    /// 清空 offline_at / offline_from_status
    pub clears_offline: bool,
}

impl Transition {
    fn base(to: HotelStatus, audit: AuditAction, event: &'static str) -> Self {
        Transition {
            to,
            audit,
            event,
            to_admin_room: false,
            sets_reject_reason: false,
            clears_reject_reason: false,
            stamps_published_at: false,
            marks_offline: false,
            clears_offline: false,
        }
    }
}

/// 流转判定
///
/// `offline_from` 仅在 Restore 时使用：恢复到下线前的状态，
/// 字段缺失时回退到 PUBLISHED（正常流程里 OFFLINE 只能从
/// PUBLISHED 进入，该字段按可空建模）。
pub fn transition(
    current: HotelStatus,
    action: LifecycleAction,
    offline_from: Option<HotelStatus>,
) -> Result<Transition, AppError> {
    use HotelStatus::*;
    use LifecycleAction::*;

    let t = match (action, current) {
        // 商户编辑：状态保持不变，REJECTED 编辑后仍是 REJECTED
        (Update, Draft | Rejected) => {
            Transition::base(current, AuditAction::Update, "hotel:updated")
        }
        (Submit, Draft | Rejected | HotelStatus::Offline) => Transition {
            to_admin_room: true,
            clears_reject_reason: true,
            clears_offline: true,
            ..Transition::base(Submitted, AuditAction::Submit, "hotel:submitted")
        },
        (Approve, Submitted) => Transition {
            clears_reject_reason: true,
            ..Transition::base(Approved, AuditAction::Approve, "hotel:reviewed")
        },
        (Reject, Submitted) => Transition {
            sets_reject_reason: true,
            ..Transition::base(Rejected, AuditAction::Reject, "hotel:reviewed")
        },
        (Publish, Approved | HotelStatus::Offline) => Transition {
            stamps_published_at: true,
            clears_offline: true,
            ..Transition::base(Published, AuditAction::Publish, "hotel:published")
        },
        (LifecycleAction::Offline, Published) => Transition {
            marks_offline: true,
            ..Transition::base(HotelStatus::Offline, AuditAction::Offline, "hotel:offline")
        },
        (Restore, HotelStatus::Offline) => Transition {
            clears_offline: true,
            ..Transition::base(
                offline_from.unwrap_or(Published),
                AuditAction::Restore,
                "hotel:restored",
            )
        },
        _ => return Err(AppError::InvalidTransition { current, action }),
    };

    Ok(t)
}

/// 提交审核的最低完整性门槛：名称、地址、至少一个房型
pub fn validate_submission(
    name_cn: &str,
    address: &str,
    room_type_count: i64,
) -> Result<(), AppError> {
    if name_cn.trim().is_empty() || address.trim().is_empty() {
        return Err(AppError::Validation(
            "酒店基础信息不完整，无法提交审核".to_string(),
        ));
    }
    if room_type_count < 1 {
        return Err(AppError::Validation(
            "至少需要配置 1 个房型，才能提交审核".to_string(),
        ));
    }
    Ok(())
}

/// 驳回必须附带非空原因
pub fn validate_reject_reason(reason: Option<&str>) -> Result<String, AppError> {
    match reason {
        Some(r) if !r.trim().is_empty() => Ok(r.to_string()),
        _ => Err(AppError::Validation("不通过必须填写原因".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use HotelStatus::*;
    use LifecycleAction::*;

    /// 流转表里的全部合法 (动作, 当前状态) 组合
    const LEGAL: [(LifecycleAction, HotelStatus); 11] = [
        (Update, Draft),
        (Update, Rejected),
        (Submit, Draft),
        (Submit, Rejected),
        (Submit, HotelStatus::Offline),
        (Approve, Submitted),
        (Reject, Submitted),
        (Publish, Approved),
        (Publish, HotelStatus::Offline),
        (LifecycleAction::Offline, Published),
        (Restore, HotelStatus::Offline),
    ];

    fn is_legal(action: LifecycleAction, status: HotelStatus) -> bool {
        LEGAL.iter().any(|&(a, s)| a == action && s == status)
    }

    #[test]
    fn transition_table_closure() {
        // 表外的任何组合都必须报 InvalidTransition，并带回现场
        for status in HotelStatus::ALL {
            for action in LifecycleAction::ALL {
                let result = transition(status, action, None);
                if is_legal(action, status) {
                    assert!(result.is_ok(), "{action:?} from {status:?} should be legal");
                } else {
                    match result {
                        Err(AppError::InvalidTransition { current, action: a }) => {
                            assert_eq!(current, status);
                            assert_eq!(a, action);
                        }
                        other => panic!("{action:?} from {status:?} => {other:?}"),
                    }
                }
            }
        }
    }

    #[test]
    fn duplicate_terminal_actions_rejected() {
        assert!(transition(Approved, Approve, None).is_err());
        assert!(transition(Published, Publish, None).is_err());
    }

    #[test]
    fn update_keeps_current_status() {
        assert_eq!(transition(Draft, Update, None).unwrap().to, Draft);
        assert_eq!(transition(Rejected, Update, None).unwrap().to, Rejected);
    }

    #[test]
    fn submit_clears_reject_reason_and_offline_bookkeeping() {
        let t = transition(Rejected, Submit, None).unwrap();
        assert_eq!(t.to, Submitted);
        assert!(t.clears_reject_reason);
        assert!(t.clears_offline);
        assert!(t.to_admin_room);
        assert_eq!(t.event, "hotel:submitted");
    }

    #[test]
    fn reject_sets_reason_approve_clears_it() {
        let reject = transition(Submitted, Reject, None).unwrap();
        assert!(reject.sets_reject_reason);
        assert_eq!(reject.to, Rejected);

        let approve = transition(Submitted, Approve, None).unwrap();
        assert!(approve.clears_reject_reason);
        assert_eq!(approve.to, Approved);
    }

    #[test]
    fn publish_stamps_published_at_only_once() {
        let t = transition(Approved, Publish, None).unwrap();
        assert!(t.stamps_published_at);
        // 从 OFFLINE 重新发布也走同一条 COALESCE 语义
        let t = transition(HotelStatus::Offline, Publish, None).unwrap();
        assert!(t.stamps_published_at);
        assert!(t.clears_offline);
    }

    #[test]
    fn offline_restore_round_trip() {
        let off = transition(Published, LifecycleAction::Offline, None).unwrap();
        assert_eq!(off.to, HotelStatus::Offline);
        assert!(off.marks_offline);

        let back = transition(HotelStatus::Offline, Restore, Some(Published)).unwrap();
        assert_eq!(back.to, Published);
        assert!(back.clears_offline);
    }

    #[test]
    fn restore_falls_back_to_published() {
        let t = transition(HotelStatus::Offline, Restore, None).unwrap();
        assert_eq!(t.to, Published);
    }

    #[test]
    fn submission_gate() {
        assert!(validate_submission("山景酒店", "上海市浦东区", 1).is_ok());
        assert!(validate_submission("山景酒店", "上海市浦东区", 0).is_err());
        assert!(validate_submission("", "上海市浦东区", 1).is_err());
        assert!(validate_submission("山景酒店", "   ", 1).is_err());
    }

    #[test]
    fn reject_reason_must_be_non_blank() {
        assert!(validate_reject_reason(None).is_err());
        assert!(validate_reject_reason(Some("")).is_err());
        assert!(validate_reject_reason(Some("   ")).is_err());
        assert_eq!(
            validate_reject_reason(Some("缺少房型描述")).unwrap(),
            "缺少房型描述"
        );
    }

    #[test]
    fn status_token_round_trip() {
        for status in HotelStatus::ALL {
            assert_eq!(HotelStatus::parse(status.as_str()), Some(status));
        }
        // 历史原型的小写 token 在入口被归一化
        assert_eq!(HotelStatus::parse("published"), Some(Published));
        assert_eq!(HotelStatus::parse(" draft "), Some(Draft));
        assert_eq!(HotelStatus::parse("UNKNOWN"), None);
    }
}
