//! End-to-end form engine behavior over backend-shaped descriptors

use chrono::NaiveDate;
use doctype_form::prelude::*;
use doctype_form::{Binding, DateMode, FieldCheck, NumberFormat, OptionPolicy, RowMode, TableError};
use doctype_meta::{FieldDescriptor, FieldType, OptionItem, Record};
use doctype_test_utils::{documents_table, lead_descriptors, plot_detail_descriptors};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

#[test]
fn plot_detail_without_number_has_one_error() {
    let fields = plot_detail_descriptors();
    let schema = SchemaBuilder::new().build(Some(fields.as_slice()));
    let mut state = FormState::new(&fields);
    state.set("plot_status", json!("Booked"));

    let report = state.submit(&schema).unwrap_err();
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.error("plot_no"), Some("Plot No is required"));
    assert_eq!(report.to_string(), "Plot No is required");
}

#[test]
fn picked_date_is_shifted_one_day() {
    let field = FieldDescriptor::new("follow_up_date", FieldType::Date);
    let picked = NaiveDate::from_ymd_opt(2025, 1, 15)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    let value = FieldRenderer::new()
        .apply(&field, &json!(""), ControlEvent::Pick(picked))
        .unwrap();
    assert_eq!(value, json!("2025-01-16"));

    let exact = FieldRenderer::with_options(RenderOptions::default().with_date_day_offset(0));
    let value = exact.apply(&field, &json!(""), ControlEvent::Pick(picked)).unwrap();
    assert_eq!(value, json!("2025-01-15"));
}

#[test]
fn select_options_keep_declaration_order() {
    let fields = plot_detail_descriptors();
    let state = FormState::new(&fields);
    let rendered = DynamicForm::default().render(Some(fields.as_slice()), Some(&["plot_status"][..]), &state);

    let Control::Select { options, selected } = &rendered[0].control else {
        panic!("plot_status must render a select");
    };
    let values: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
    assert_eq!(values, vec!["New", "Booked", "Sold"]);
    assert_eq!(selected, &None);
}

#[test]
fn link_options_are_soft_by_default() {
    let field = FieldDescriptor::new("customer", FieldType::Link)
        .with_label("Customer")
        .with_options("Customer")
        .with_options_list(vec![OptionItem::new("Asha Rao", "CUST-1")]);
    let fields = vec![field];

    let soft = SchemaBuilder::new().build(Some(fields.as_slice()));
    assert!(matches!(soft.check("customer", &json!("CUST-9")), FieldCheck::Warning(_)));
    assert_eq!(soft.check("customer", &json!("CUST-1")), FieldCheck::Ok);

    let strict = SchemaBuilder::with_options(SchemaOptions::default().with_option_policy(OptionPolicy::Reject))
        .build(Some(fields.as_slice()));
    assert!(matches!(strict.check("customer", &json!("CUST-9")), FieldCheck::Error(_)));
}

#[test]
fn sub_table_add_deduplicates_last_wins() {
    let table = documents_table();
    let mut editor = SubTableEditor::new(table).unwrap().with_key_fields(["document_type"]);

    for (kind, remarks) in [("Aadhaar", "front"), ("PAN", ""), ("Aadhaar", "both sides")] {
        let mut row = editor.open_add();
        assert_eq!(row.mode(), RowMode::Add);
        row.set("document_type", json!(kind));
        row.set("remarks", json!(remarks));
        editor.confirm(&mut row).unwrap();
    }

    assert_eq!(editor.len(), 2);
    assert_eq!(editor.rows()[0].get_str("remarks"), Some("both sides"));
    assert_eq!(editor.rows()[0].get("idx"), Some(&json!(1)));
    assert_eq!(editor.rows()[1].get_str("document_type"), Some("PAN"));
}

#[test]
fn sub_table_rows_are_validated_and_edited_by_index() {
    let fields = lead_descriptors();
    let mut state = FormState::new(&fields);
    let mut editor = state.open_table("documents").unwrap();

    let mut row = editor.open_add();
    let err = editor.confirm(&mut row).unwrap_err();
    assert!(matches!(err, TableError::InvalidRow(report) if report.error("document_type").is_some()));

    row.set("document_type", json!("PAN"));
    row.set("document", json!("/files/pan.pdf"));
    assert_eq!(editor.confirm(&mut row).unwrap(), 0);
    state.commit_table(&editor);

    let mut editor = state.open_table("documents").unwrap();
    let mut edit = editor.open_edit(0).unwrap();
    edit.set("remarks", json!("verified"));
    assert_eq!(editor.confirm(&mut edit).unwrap(), 0);

    let pending = editor.request_delete(0).unwrap();
    let mut stale = editor.open_edit(0).unwrap();
    editor.confirm_delete(pending).unwrap();
    assert!(matches!(editor.confirm(&mut stale), Err(TableError::StaleIndex { index: 0, len: 0 })));
}

#[test]
fn render_edit_render_round_trip() {
    let fields = lead_descriptors();
    let renderer = FieldRenderer::new();
    let form = DynamicForm::new(renderer.clone(), FormOptions::default());
    let mut state = FormState::from_record(&fields, &Record::new().with("budget", 1500));

    let requested = ["first_name", "budget", "status", "mobile_no"];
    let before = form.render(Some(fields.as_slice()), Some(&requested[..]), &state);
    assert_eq!(before.len(), 4);
    assert!(matches!(&before[3].control, Control::TextInput { phone: true, .. }));

    state.apply_event(&renderer, "first_name", ControlEvent::Text("Asha".into())).unwrap();
    state.apply_event(&renderer, "budget", ControlEvent::Text("2500.50".into())).unwrap();
    state.apply_event(&renderer, "status", ControlEvent::Select(Some("Replied".into()))).unwrap();

    let after = form.render(Some(fields.as_slice()), Some(&requested[..]), &state);
    assert_eq!(after[0].control, Control::TextInput { value: "Asha".into(), numeric: None, phone: false });
    assert_eq!(after[1].control, Control::NumberInput { value: "2500.5".into() });
    assert!(matches!(&after[2].control, Control::Select { selected: Some(s), .. } if s == "Replied"));
    assert!(state.is_dirty());
}

/// Event a user would produce by re-entering what the control shows
fn replay(control: &Control) -> ControlEvent {
    match control {
        Control::TextInput { value, .. }
        | Control::NumberInput { value }
        | Control::TextArea { value }
        | Control::DatePicker { value, .. } => ControlEvent::Text(value.clone()),
        Control::RichText { html } => ControlEvent::Text(html.clone()),
        Control::Checkbox { checked } => ControlEvent::Toggle(*checked),
        Control::ColorPicker { hex } => ControlEvent::Color(hex.clone()),
        Control::Attachment { path, .. } => ControlEvent::Attach(path.clone()),
        Control::Select { selected, .. } => ControlEvent::Select(selected.clone()),
        other => panic!("no replay for {other:?}"),
    }
}

#[test]
fn scalar_types_survive_render_edit_render() {
    let picked = NaiveDate::from_ymd_opt(2025, 1, 15)
        .unwrap()
        .and_hms_opt(9, 5, 7)
        .unwrap();
    let cases: Vec<(FieldDescriptor, ControlEvent, serde_json::Value, Control)> = vec![
        (
            FieldDescriptor::new("first_name", FieldType::Data),
            ControlEvent::Text("Asha".into()),
            json!("Asha"),
            Control::TextInput { value: "Asha".into(), numeric: None, phone: false },
        ),
        (
            FieldDescriptor::new("area", FieldType::Int),
            ControlEvent::Text("12,500".into()),
            json!(12500),
            Control::TextInput { value: "12,500".into(), numeric: Some(NumberFormat::INT), phone: false },
        ),
        (
            FieldDescriptor::new("rate", FieldType::Float),
            ControlEvent::Text("1,234.567".into()),
            json!(1234.56),
            Control::TextInput { value: "1,234.56".into(), numeric: Some(NumberFormat::FLOAT), phone: false },
        ),
        (
            FieldDescriptor::new("budget", FieldType::Currency),
            ControlEvent::Text("2500.50".into()),
            json!(2500.5),
            Control::NumberInput { value: "2500.5".into() },
        ),
        (
            FieldDescriptor::new("share", FieldType::Percent),
            ControlEvent::Text("12.5".into()),
            json!(12.5),
            Control::NumberInput { value: "12.5".into() },
        ),
        (
            FieldDescriptor::new("remarks", FieldType::SmallText),
            ControlEvent::Text("Call after 5".into()),
            json!("Call after 5"),
            Control::TextArea { value: "Call after 5".into() },
        ),
        (
            FieldDescriptor::new("follow_up_date", FieldType::Date),
            ControlEvent::Pick(picked),
            json!("2025-01-16"),
            Control::DatePicker { mode: DateMode::Date, value: "2025-01-16".into() },
        ),
        (
            FieldDescriptor::new("visit_date", FieldType::Date),
            ControlEvent::Text("2025-02-01".into()),
            json!("2025-02-01"),
            Control::DatePicker { mode: DateMode::Date, value: "2025-02-01".into() },
        ),
        (
            FieldDescriptor::new("slot", FieldType::Time),
            ControlEvent::Pick(picked),
            json!("09:05:07"),
            Control::DatePicker { mode: DateMode::Time, value: "09:05:07".into() },
        ),
        (
            FieldDescriptor::new("visited_at", FieldType::Datetime),
            ControlEvent::Pick(picked),
            json!("2025-01-15T09:05:07.000Z"),
            Control::DatePicker { mode: DateMode::Datetime, value: "2025-01-15T09:05:07.000Z".into() },
        ),
        (
            FieldDescriptor::new("modified", FieldType::Datetime),
            ControlEvent::Text("2025-01-15 09:05:07.123456".into()),
            json!("2025-01-15 09:05:07.123456"),
            Control::DatePicker { mode: DateMode::Datetime, value: "2025-01-15 09:05:07.123456".into() },
        ),
        (
            FieldDescriptor::new("active", FieldType::Check),
            ControlEvent::Toggle(true),
            json!(true),
            Control::Checkbox { checked: true },
        ),
        (
            FieldDescriptor::new("tag_color", FieldType::Color),
            ControlEvent::Color("#1a2b3c".into()),
            json!("#1a2b3c"),
            Control::ColorPicker { hex: "#1a2b3c".into() },
        ),
        (
            FieldDescriptor::new("deed", FieldType::Attach),
            ControlEvent::Attach("/files/deed.pdf".into()),
            json!("/files/deed.pdf"),
            Control::Attachment {
                path: "/files/deed.pdf".into(),
                url: Some("/files/deed.pdf".into()),
                image: false,
                clearable: false,
            },
        ),
        (
            FieldDescriptor::new("notes", FieldType::TextEditor),
            ControlEvent::Text("<p>Site visit done</p>".into()),
            json!("<p>Site visit done</p>"),
            Control::RichText { html: "<p>Site visit done</p>".into() },
        ),
        (
            FieldDescriptor::new("plot_status", FieldType::Select).with_options("New\nBooked\nSold"),
            ControlEvent::Select(Some("Sold".into())),
            json!("Sold"),
            Control::Select {
                options: vec![OptionItem::plain("New"), OptionItem::plain("Booked"), OptionItem::plain("Sold")],
                selected: Some("Sold".into()),
            },
        ),
    ];

    let renderer = FieldRenderer::new();
    for (field, event, stored, control) in cases {
        let name = field.fieldname.clone();
        let value = renderer.apply(&field, &json!(""), event).unwrap();
        assert_eq!(value, stored, "{name} stored");

        let rendered = renderer.render(&field, Binding::new(&field, &value)).unwrap();
        assert_eq!(rendered.control, control, "{name} rendered");

        let again = renderer.apply(&field, &value, replay(&rendered.control)).unwrap();
        assert_eq!(again, value, "{name} re-applied");
        let rerendered = renderer.render(&field, Binding::new(&field, &again)).unwrap();
        assert_eq!(rerendered, rendered, "{name} re-rendered");
    }
}

fn structural_type() -> impl Strategy<Value = FieldType> {
    prop_oneof![
        Just(FieldType::SectionBreak),
        Just(FieldType::ColumnBreak),
        Just(FieldType::TabBreak),
        Just(FieldType::Button),
        Just(FieldType::ReadOnly),
    ]
}

proptest! {
    #[test]
    fn grouped_numbers_round_trip(whole in 0_u32..u32::MAX, cents in 0_u64..10_000_000_000) {
        let renderer = FieldRenderer::new();

        let int = FieldDescriptor::new("area", FieldType::Int);
        let Control::TextInput { value: shown, .. } =
            renderer.render(&int, Binding::new(&int, &json!(whole))).unwrap().control
        else {
            panic!("Int renders a text input");
        };
        let stored = renderer.apply(&int, &json!(""), ControlEvent::Text(shown)).unwrap();
        prop_assert_eq!(stored, json!(whole));

        #[allow(clippy::cast_precision_loss)]
        let amount = cents as f64 / 100.0;
        let float = FieldDescriptor::new("rate", FieldType::Float);
        let Control::TextInput { value: shown, .. } =
            renderer.render(&float, Binding::new(&float, &json!(amount))).unwrap().control
        else {
            panic!("Float renders a text input");
        };
        let stored = renderer.apply(&float, &json!(""), ControlEvent::Text(shown)).unwrap();
        prop_assert_eq!(stored.as_f64(), Some(amount));
    }

    #[test]
    fn structural_fields_never_carry_rules(
        types in prop::collection::vec(structural_type(), 1..8),
        required in any::<bool>(),
    ) {
        let mut fields: Vec<FieldDescriptor> = types
            .into_iter()
            .enumerate()
            .map(|(i, ty)| {
                let field = FieldDescriptor::new(format!("f{i}"), ty);
                if required { field.required() } else { field }
            })
            .collect();
        fields.push(FieldDescriptor::new("plot_no", FieldType::Data).required());

        let schema = SchemaBuilder::new().build(Some(fields.as_slice()));
        prop_assert_eq!(schema.len(), 1);
        prop_assert!(schema.contains("plot_no"));

        let state = FormState::new(&fields);
        prop_assert_eq!(state.values().len(), 1);

        let rendered = DynamicForm::default().render_all(&fields, &state);
        let all_locked = rendered.iter().all(|f| {
            f.fieldname == "plot_no" || matches!(f.control, Control::Button { .. } | Control::ReadOnly { .. })
        });
        prop_assert!(all_locked);
    }
}
