//! Tests for pagination strategies

use super::*;
use serde_json::json;

#[test]
fn test_initial_params_carry_page_size() {
    let paginator = InfoPaginator::new(200);
    let params = paginator.initial_params();

    assert_eq!(params.get("per_page"), Some(&"200".to_string()));
    assert!(!params.contains_key("page"));
}

#[test]
fn test_more_records_increments_page() {
    let paginator = InfoPaginator::new(200);
    let mut state = PaginationState::new();

    let body = json!({"data": [{"id": "1"}], "info": {"more_records": true}});
    let next = paginator.process_response(&body, 1, &mut state);

    assert_eq!(next, NextPage::with_param("page", "2"));
    assert_eq!(state.page, 2);
    assert!(!state.done);

    let next = paginator.process_response(&body, 1, &mut state);
    assert_eq!(next, NextPage::with_param("page", "3"));
    assert_eq!(state.total_fetched, 2);
}

#[test]
fn test_page_token_preferred_over_more_records() {
    let paginator = InfoPaginator::new(200);
    let mut state = PaginationState::new();

    let body = json!({
        "data": [],
        "info": {"more_records": true, "next_page_token": "tok-123"}
    });
    let next = paginator.process_response(&body, 0, &mut state);

    assert_eq!(next, NextPage::with_param("page_token", "tok-123"));
    assert_eq!(state.page_token.as_deref(), Some("tok-123"));
    assert_eq!(state.page, 1);
}

#[test]
fn test_empty_token_falls_through() {
    let paginator = InfoPaginator::new(200);
    let mut state = PaginationState::new();

    let body = json!({"info": {"next_page_token": "", "more_records": false}});
    assert!(paginator.process_response(&body, 0, &mut state).is_done());
    assert!(state.done);
}

#[test]
fn test_terminal_responses() {
    let paginator = InfoPaginator::new(200);

    for body in [json!({}), json!({"data": [{"id": "1"}]}), json!(null)] {
        let mut state = PaginationState::new();
        assert!(paginator.process_response(&body, 0, &mut state).is_done());
        assert!(state.done);
    }
}

#[test]
fn test_no_paginator_single_page() {
    let paginator = NoPaginator::with_page_size(200);
    let mut state = PaginationState::new();

    let params = paginator.initial_params();
    assert_eq!(params.get("per_page"), Some(&"200".to_string()));

    let body = json!({"roles": [], "info": {"more_records": true}});
    assert!(paginator.process_response(&body, 0, &mut state).is_done());
}
