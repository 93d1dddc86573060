// src/dashboard_tests.rs

#[cfg(test)]
mod tests {
    use crate::dashboard::*;
    use crate::error::PortalError;
    use crate::forms::LeaveStatus;
    use crate::test_support::{client_for, spawn_stub, StubReply};
    use chrono::NaiveDate;
    use serde_json::{json, Value};
    use std::time::Duration;

    fn d(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .unwrap_or_else(|_| panic!("Invalid date string format: {}", date_str))
    }

    fn rows(value: Value) -> Vec<Row> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    async fn dashboard_with(replies: Vec<(&str, StubReply)>) -> (AdminDashboard, crate::test_support::Recorder) {
        let (base, recorder) = spawn_stub(replies).await;
        let dashboard = AdminDashboard::new(client_for(&base, Duration::from_secs(5)))
            .with_alert_settle_delay(Duration::ZERO);
        (dashboard, recorder)
    }

    // --- Coercion ---

    #[test]
    fn test_to_numeric() {
        assert_eq!(to_numeric(&json!("3")), json!(3));
        assert_eq!(to_numeric(&json!(" 2.5 ")), json!(2.5));
        assert_eq!(to_numeric(&json!(7)), json!(7));
        assert_eq!(to_numeric(&json!("three")), Value::Null);
        assert_eq!(to_numeric(&json!("")), Value::Null);
        assert_eq!(to_numeric(&Value::Null), Value::Null);
    }

    #[test]
    fn test_coerce_only_touches_named_columns() {
        let mut data = rows(json!([
            {"Days": "3", "Reason": "42"},
            {"Days": "n/a"},
            {"Reason": "no days column"}
        ]));
        coerce_numeric(&mut data, &LEAVE_NUMERIC_COLUMNS);
        assert_eq!(data[0]["Days"], json!(3));
        assert_eq!(data[0]["Reason"], json!("42"));
        assert_eq!(data[1]["Days"], Value::Null);
        assert!(!data[2].contains_key("Days"));
    }

    // --- Filters ---

    fn attendance_rows() -> Vec<Row> {
        rows(json!([
            {"Employee ID": "E001", "Employee Name": "Alice Smith", "Department": "IT"},
            {"Employee ID": "E002", "Employee Name": "Bob Jones", "Department": "HR"},
            {"Employee ID": "E013", "Employee Name": "Carol", "Department": "IT"},
            {"Employee ID": 14, "Employee Name": null, "Department": "Sales"}
        ]))
    }

    #[test]
    fn test_attendance_filter_by_department() {
        let filter = AttendanceFilter {
            department: Some("IT".to_string()),
            search: None,
        };
        assert_eq!(filter.apply(attendance_rows()).len(), 2);

        let all = AttendanceFilter {
            department: Some(ALL_DEPARTMENTS.to_string()),
            search: None,
        };
        assert_eq!(all.apply(attendance_rows()).len(), 4);
    }

    #[test]
    fn test_attendance_search_is_case_insensitive_on_id_or_name() {
        let by_name = AttendanceFilter {
            department: None,
            search: Some("smith".to_string()),
        };
        let found = by_name.apply(attendance_rows());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["Employee ID"], "E001");

        let by_id = AttendanceFilter {
            department: None,
            search: Some("e01".to_string()),
        };
        assert_eq!(by_id.apply(attendance_rows()).len(), 1);

        // Numeric ids are matched on their text form
        let numeric = AttendanceFilter {
            department: None,
            search: Some("14".to_string()),
        };
        assert_eq!(numeric.apply(attendance_rows()).len(), 1);
    }

    #[test]
    fn test_attendance_filters_combine() {
        let filter = AttendanceFilter {
            department: Some("IT".to_string()),
            search: Some("carol".to_string()),
        };
        let found = filter.apply(attendance_rows());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["Employee ID"], "E013");
    }

    #[test]
    fn test_leave_status_filter() {
        let data = rows(json!([
            {"Leave ID": "L1", "Status": "Pending"},
            {"Leave ID": "L2", "Status": "Approved"},
            {"Leave ID": "L3", "Status": "Pending"}
        ]));
        assert_eq!(filter_leave_by_status(data.clone(), None).len(), 3);
        assert_eq!(
            filter_leave_by_status(data.clone(), Some(LeaveStatus::Pending)).len(),
            2
        );
        assert!(filter_leave_by_status(data, Some(LeaveStatus::Rejected)).is_empty());
    }

    // --- Alerts ---

    #[test]
    fn test_cell_is_on_day_accepts_three_renderings() {
        let day = d("2024-01-05");
        assert!(cell_is_on_day("2024-01-05", day));
        assert!(cell_is_on_day("2024-01-05T08:00:00.000Z", day));
        assert!(cell_is_on_day("01/05/2024", day));
        assert!(cell_is_on_day("1/5/2024 9:45:00", day));
        assert!(!cell_is_on_day("11/5/2024", day));
        assert!(!cell_is_on_day("2024-01-06", day));
    }

    #[test]
    fn test_todays_alerts_prefers_today_then_falls_back() {
        let data = rows(json!([
            {"Date": "2024-01-03", "Employee ID": "E1"},
            {"Date": "1/5/2024", "Employee ID": "E2"},
            {"Date": "2024-01-04", "Employee ID": "E3"}
        ]));
        let (today, fallback) = todays_alerts(&data, d("2024-01-05"), 2);
        assert!(!fallback);
        assert_eq!(today.len(), 1);
        assert_eq!(today[0]["Employee ID"], "E2");

        let (latest, fallback) = todays_alerts(&data, d("2024-02-01"), 2);
        assert!(fallback);
        let ids: Vec<_> = latest.iter().map(|r| r["Employee ID"].clone()).collect();
        assert_eq!(ids, vec![json!("E2"), json!("E3")]);

        let (everything, _) = todays_alerts(&data, d("2024-02-01"), 10);
        assert_eq!(everything.len(), 3);
    }

    #[test]
    fn test_alert_from_row_defaults_and_severity() {
        let row = rows(json!([{"Severity": "HIGH", "Employee Name": "Dana"}])).remove(0);
        let alert = Alert::from_row(&row);
        assert_eq!(alert.severity, Severity::High);
        assert_eq!(alert.alert_type, "UNKNOWN");
        assert_eq!(alert.employee_name, "Dana");
        assert_eq!(alert.message, "No message");

        let empty = Alert::from_row(&Row::new());
        assert_eq!(empty.severity, Severity::Medium);
        assert_eq!(Severity::parse("info"), Severity::Low);
    }

    // --- Service ---

    #[tokio::test]
    async fn test_stats_default_missing_fields_to_zero() {
        let (dashboard, _) = dashboard_with(vec![(
            "admin/get-stats",
            StubReply::json(json!({"total_employees": 20, "present_today": "15"})),
        )])
        .await;
        let stats = dashboard.stats().await.unwrap();
        assert_eq!(
            stats,
            SystemStats {
                total_employees: 20,
                present_today: 15,
                pending_leave: 0,
                late_arrivals: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_overtime_list_is_coerced() {
        let (dashboard, _) = dashboard_with(vec![(
            "admin/get-overtime",
            StubReply::json(json!({"data": [
                {"Employee ID": "E001", "Overtime Hours": "2.0", "Overtime Pay": "45.0", "Reason": "Release"}
            ]})),
        )])
        .await;
        let data = dashboard.list(RecordKind::Overtime).await.unwrap();
        assert_eq!(data[0]["Overtime Hours"], json!(2.0));
        assert_eq!(data[0]["Overtime Pay"], json!(45.0));
        assert_eq!(data[0]["Reason"], json!("Release"));
    }

    #[tokio::test]
    async fn test_missing_data_field_is_empty_list() {
        let (dashboard, _) =
            dashboard_with(vec![("admin/get-employees", StubReply::json(json!({})))]).await;
        assert!(dashboard.list(RecordKind::Employees).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_review_leave_sends_decision() {
        let (dashboard, recorder) = dashboard_with(vec![(
            "admin/approve-leave",
            StubReply::json(json!({"success": true})),
        )])
        .await;
        let review = LeaveReview {
            leave_id: "L20240101090000".to_string(),
            decision: LeaveDecision::Approved,
            approved_by: DEFAULT_REVIEWER.to_string(),
        };
        dashboard.review_leave(&review).await.unwrap();
        assert_eq!(
            recorder.calls_to("admin/approve-leave")[0].body,
            json!({"Leave ID": "L20240101090000", "Status": "Approved", "Approved By": "Admin"})
        );
    }

    #[tokio::test]
    async fn test_review_leave_without_success_is_rejected() {
        let (dashboard, _) = dashboard_with(vec![(
            "admin/approve-leave",
            StubReply::json(json!({"success": false, "message": "Leave ID not found"})),
        )])
        .await;
        let review = LeaveReview {
            leave_id: "L0".to_string(),
            decision: LeaveDecision::Rejected,
            approved_by: DEFAULT_REVIEWER.to_string(),
        };
        match dashboard.review_leave(&review).await.unwrap_err() {
            PortalError::BackendRejected { message, .. } => assert_eq!(message, "Leave ID not found"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_review_leave_without_message_is_unknown_error() {
        let (dashboard, _) =
            dashboard_with(vec![("admin/approve-leave", StubReply::json(json!({"ok": 1})))]).await;
        let review = LeaveReview {
            leave_id: "L0".to_string(),
            decision: LeaveDecision::Approved,
            approved_by: DEFAULT_REVIEWER.to_string(),
        };
        let err = dashboard.review_leave(&review).await.unwrap_err();
        assert!(err.to_string().contains("Unknown error"));
    }

    #[tokio::test]
    async fn test_check_alerts_with_no_findings_skips_fetch() {
        let (dashboard, recorder) = dashboard_with(vec![(
            "admin/check-alerts",
            StubReply::json(json!({"alerts_found": 0})),
        )])
        .await;
        let check = dashboard.check_alerts(d("2024-01-05")).await.unwrap();
        assert_eq!(check.alerts_found, 0);
        assert!(check.alerts.is_empty());
        assert!(recorder.calls_to("admin/get-alerts").is_empty());
    }

    #[tokio::test]
    async fn test_check_alerts_returns_todays_alerts() {
        let (dashboard, recorder) = dashboard_with(vec![
            ("admin/check-alerts", StubReply::json(json!({"alerts_found": 1}))),
            (
                "admin/get-alerts",
                StubReply::json(json!({"data": [
                    {"Date": "2024-01-04", "Employee ID": "E009", "Severity": "LOW"},
                    {"Date": "01/05/2024", "Employee ID": "E001", "Alert Type": "LATE", "Severity": "HIGH"}
                ]})),
            ),
        ])
        .await;
        let check = dashboard.check_alerts(d("2024-01-05")).await.unwrap();
        assert_eq!(check.alerts_found, 1);
        assert!(!check.showing_latest);
        assert_eq!(check.alerts.len(), 1);
        assert_eq!(check.alerts[0].employee_id, "E001");
        assert_eq!(check.alerts[0].severity, Severity::High);
        assert_eq!(recorder.calls_to("admin/get-alerts").len(), 1);
    }

    #[tokio::test]
    async fn test_payroll_returns_raw_body() {
        let (dashboard, _) = dashboard_with(vec![(
            "admin/generate-payroll",
            StubReply::json(json!({"success": true, "employees_processed": 20})),
        )])
        .await;
        let body = dashboard.generate_payroll().await.unwrap();
        assert_eq!(body["employees_processed"], 20);
    }
}
