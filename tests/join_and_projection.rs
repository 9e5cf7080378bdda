use bumpetl::{
    explode_keywords, explode_safety_flags, explode_secondary_topics, indicator_rows, join_annotations,
    pending_annotations, safety_indicators, sanitize_post, AnnotatedPost, AnnotationRecord, CanonicalPost,
    RedactionChain, SanitizeCfg, SanitizedPost, TRACKED_SAFETY_FLAGS,
};
use serde_json::json;

fn sanitized(id: &str, content: &str) -> SanitizedPost {
    let c = CanonicalPost {
        post_id: id.into(),
        post_date: "2024-05-01".into(),
        post_timestamp: Some(1714557600),
        post_flair: String::new(),
        title: "t".into(),
        url: String::new(),
        content: content.into(),
        score: 1,
        num_comments: 0,
        subreddit: "babybumps".into(),
        scraped_at: None,
        content_hash: String::new(),
    };
    sanitize_post(&c, &RedactionChain::standard(), &SanitizeCfg::default()).unwrap()
}

fn annotation(v: serde_json::Value) -> AnnotationRecord {
    serde_json::from_value(v).unwrap()
}

fn posts() -> Vec<SanitizedPost> {
    vec![
        sanitized("a", "Bleeding and cramping since this morning, should I worry?"),
        sanitized("b", "Finally felt the baby kick today, so happy!"),
        sanitized("c", "too short"),
    ]
}

/// Every sanitized row appears exactly once when annotations are unique:
/// - matched rows carry the annotation,
/// - unmatched rows carry null annotation columns (including null lists),
/// - annotations for unknown posts are dropped.
#[test]
fn left_join_is_total() {
    let anns = vec![
        annotation(json!({"post_id": "a", "primary_topic": "bleeding", "urgency_0_3": 2,
                          "keywords": ["bleeding"], "safety_flags": ["urgent_bleeding"]})),
        annotation(json!({"post_id": "zzz", "keywords": ["ghost"]})),
    ];
    let joined = join_annotations(&posts(), &anns);

    assert_eq!(joined.len(), 3);
    let ids: Vec<&str> = joined.iter().map(AnnotatedPost::post_id).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);

    assert_eq!(joined[0].annotation.primary_topic.as_deref(), Some("bleeding"));
    assert_eq!(joined[0].annotation.urgency_0_3, Some(2));
    assert!(joined[0].annotation.is_matched());

    assert!(!joined[1].annotation.is_matched());
    let v = serde_json::to_value(&joined[1]).unwrap();
    assert!(v["primary_topic"].is_null());
    assert!(v["keywords"].is_null());
    assert!(v["safety_flags"].is_null());
    assert_eq!(v["post_id"], "b");
    assert_eq!(v["text_for_llm"], "Finally felt the baby kick today, so happy!");
}

/// Duplicate annotations for one post fan the post out, in annotation input order.
#[test]
fn duplicate_annotations_fan_out() {
    let anns = vec![
        annotation(json!({"post_id": "b", "sentiment": "happy"})),
        annotation(json!({"post_id": "b", "sentiment": "excited"})),
    ];
    let joined = join_annotations(&posts(), &anns);
    assert_eq!(joined.len(), 4);
    let b: Vec<_> = joined.iter().filter(|r| r.post_id() == "b").collect();
    assert_eq!(b.len(), 2);
    assert_eq!(b[0].annotation.sentiment.as_deref(), Some("happy"));
    assert_eq!(b[1].annotation.sentiment.as_deref(), Some("excited"));
}

/// Two safety flags:
/// - two rows in the flag projection,
/// - bleeding and mental-health indicators set, pain and fetal concern clear.
#[test]
fn safety_flags_project_to_rows_and_indicators() {
    let anns = vec![annotation(json!({
        "post_id": "a", "safety_flags": ["urgent_bleeding", "mental_health_crisis"]
    }))];
    let joined = join_annotations(&posts(), &anns);

    let flags = explode_safety_flags(&joined);
    assert_eq!(flags.len(), 2);
    assert!(flags.iter().all(|r| r.post_id == "a"));
    assert_eq!(flags[0].safety_flag, "urgent_bleeding");
    assert_eq!(flags[1].safety_flag, "mental_health_crisis");

    let ind = indicator_rows(&joined);
    assert_eq!(ind.len(), 1, "only annotated rows get an indicator row");
    assert_eq!(ind[0].post_id, "a");
    assert!(ind[0].is_urgent_bleeding);
    assert!(ind[0].is_mh_crisis);
    assert!(!ind[0].is_urgent_pain);
    assert!(!ind[0].is_urgent_fetal_concern);
}

/// Indicator matching tolerates case and padding; unknown flags set nothing.
#[test]
fn indicators_match_loosely() {
    let flags = vec![" Urgent_Pain ".to_string(), "URGENT_FETAL_CONCERN".to_string(), "other".to_string()];
    let row = safety_indicators("x", &flags);
    assert!(row.is_urgent_pain);
    assert!(row.is_urgent_fetal_concern);
    assert!(!row.is_urgent_bleeding);
    assert!(!row.is_mh_crisis);

    let row = safety_indicators("y", &[]);
    assert!(!(row.is_urgent_pain || row.is_urgent_fetal_concern || row.is_urgent_bleeding || row.is_mh_crisis));
}

/// Keyword and topic explosions keep list order and lowercase values.
#[test]
fn keyword_and_topic_explosions() {
    let anns = vec![
        annotation(json!({"post_id": "a", "keywords": ["Bleeding", "Cramps"], "secondary_topics": ["Symptoms"]})),
        annotation(json!({"post_id": "b", "keywords": "['Kicks', 'Joy']", "secondary_topics": []})),
    ];
    let joined = join_annotations(&posts(), &anns);

    let kw: Vec<(String, String)> = explode_keywords(&joined).into_iter().map(|r| (r.post_id, r.keyword)).collect();
    assert_eq!(
        kw,
        vec![
            ("a".to_string(), "bleeding".to_string()),
            ("a".to_string(), "cramps".to_string()),
            ("b".to_string(), "kicks".to_string()),
            ("b".to_string(), "joy".to_string()),
        ]
    );

    let topics = explode_secondary_topics(&joined);
    assert_eq!(topics.len(), 1);
    assert_eq!(topics[0].topic, "symptoms");
}

/// The queue holds eligible posts with no annotation yet, honors the limit,
/// and carries only the redacted text.
#[test]
fn pending_queue_excludes_annotated_and_ineligible() {
    let mut ps = posts();
    ps.push(sanitized("d", "Email me at mom@example.com about the registry list"));
    let anns = vec![annotation(json!({"post_id": "a"}))];

    let q = pending_annotations(&ps, &anns, None);
    let ids: Vec<&str> = q.iter().map(|r| r.post_id.as_str()).collect();
    assert_eq!(ids, vec!["b", "d"], "a is annotated, c is too short");
    assert_eq!(q[1].text_for_llm, "Email me at [EMAIL] about the registry list");

    let v = serde_json::to_value(&q[1]).unwrap();
    assert!(v.get("text_raw").is_none());

    let limited = pending_annotations(&ps, &anns, Some(1));
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].post_id, "b");
}

/// Each tracked literal sets exactly one indicator column, in table order.
#[test]
fn each_tracked_flag_sets_its_own_column() {
    for (i, literal) in TRACKED_SAFETY_FLAGS.iter().enumerate() {
        let row = safety_indicators("p", &[literal.to_string()]);
        let cols = [row.is_urgent_bleeding, row.is_urgent_pain, row.is_urgent_fetal_concern, row.is_mh_crisis];
        let expected: Vec<bool> = (0..cols.len()).map(|j| j == i).collect();
        assert_eq!(cols.to_vec(), expected, "{literal}");
    }
}
