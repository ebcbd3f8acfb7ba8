#![cfg(feature = "export")]


use fixtures::*;
use reinhardt_smart_lists::export::{
	CsvExportBackend, ExcelExportBackend, ExportBackend, ExportBackendExt, ExportOptions,
	ExtraFilter, XLSX_CONTENT_TYPE, value_renderer,
};
use reinhardt_smart_lists::query::memory::MemoryQuerySet;
use reinhardt_smart_lists::query::FilterCondition;
use reinhardt_smart_lists::view::{ListConfig, ListResponse, SmartListView};
use reinhardt_smart_lists::{QueryParams, SmartListSettings};
use rstest::*;

fn view() -> SmartListView<MemoryQuerySet> {
	SmartListView::new(
		ListConfig::new()
			.with_list_display(["title", "category", "foreign_1"])
			.with_list_filter(["category"])
			.with_search_fields(["title"])
			.with_export_backend(ExcelExportBackend::new(ExportOptions::new(
				"Export to Excel",
				"samples.xlsx",
			)))
			.with_export_backend(CsvExportBackend::new(
				ExportOptions::new("Export to CSV", "samples.csv")
					.with_extra_filters(FilterCondition::exact("category", "foo")),
			)),
	)
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(10)]
fn test_limit_caps_items(sample_queryset: MemoryQuerySet, #[case] limit: usize) {
	let list = view().smart_list(&QueryParams::new(), sample_queryset).unwrap();
	let backend = CsvExportBackend::new(ExportOptions::new("CSV", "x.csv").with_limit(limit));
	assert_eq!(backend.get_items(&list).unwrap().len(), limit.min(3));
}

#[rstest]
fn test_extra_filters_restrict_items(sample_queryset: MemoryQuerySet) {
	let list = view().smart_list(&QueryParams::new(), sample_queryset).unwrap();
	let backend = CsvExportBackend::new(
		ExportOptions::new("CSV", "x.csv")
			.with_extra_filters(ExtraFilter::computed(|| FilterCondition::exact("title", "retest"))),
	);
	let items = backend.get_items(&list).unwrap();
	assert_eq!(items.len(), 1);
	assert_eq!(items[0].record().get("title").unwrap().to_string(), "retest");
}

#[rstest]
fn test_export_links(sample_queryset: MemoryQuerySet) {
	let params = QueryParams::parse("q=test");
	let response = view().get("/samples/", &params, sample_queryset).unwrap();
	let ListResponse::Page(context) = response else {
		panic!("expected the list page");
	};
	let urls: Vec<&str> = context.exports.iter().map(|link| link.url.as_str()).collect();
	assert_eq!(urls, vec!["?q=test&e=0", "?q=test&e=1"]);
	assert_eq!(context.exports[0].verbose_name, "Export to Excel");
}

#[rstest]
fn test_csv_download_uses_extra_filters_and_search(sample_queryset: MemoryQuerySet) {
	let response = view()
		.get("/samples/", &QueryParams::parse("q=test&o=1&e=1"), sample_queryset)
		.unwrap();
	let ListResponse::Http(response) = response else {
		panic!("expected a download");
	};
	assert_eq!(response.status(), 200);
	assert_eq!(response.headers()["content-type"], "text/csv");
	assert_eq!(
		response.headers()["content-disposition"],
		"attachment; filename=samples.csv"
	);
	assert_eq!(
		String::from_utf8(response.body().to_vec()).unwrap(),
		"Title,Category,Foreign 1\nretest,Foo,First Foreign\n"
	);
}

#[rstest]
fn test_excel_download(sample_queryset: MemoryQuerySet) {
	let response = view()
		.handle_export("/samples/", &QueryParams::parse("e=0"), sample_queryset)
		.unwrap();
	assert_eq!(response.headers()["content-type"], XLSX_CONTENT_TYPE);
	assert!(response.body().starts_with(b"PK"));
}

#[rstest]
#[case("e=5&q=test", "/samples/?q=test")]
#[case("e=abc", "/samples/")]
#[case("e=", "/samples/")]
fn test_unknown_backend_redirects(
	sample_queryset: MemoryQuerySet,
	#[case] query: &str,
	#[case] location: &str,
) {
	let response = view()
		.handle_export("/samples/", &QueryParams::parse(query), sample_queryset)
		.unwrap();
	assert_eq!(response.status(), 302);
	assert_eq!(response.headers()["location"], location);
}

#[rstest]
fn test_export_ignores_pagination(sample_queryset: MemoryQuerySet) {
	let view = SmartListView::new(
		ListConfig::new()
			.with_list_display(["title"])
			.with_paginate_by(1)
			.with_export_backend(CsvExportBackend::new(ExportOptions::new("CSV", "x.csv"))),
	);
	let list = view.smart_list(&QueryParams::parse("page=2"), sample_queryset).unwrap();
	let backend = &view.config().export_backends[0];
	let content = backend
		.get_content(&list, &value_renderer(&SmartListSettings::default()))
		.unwrap();
	assert_eq!(String::from_utf8(content).unwrap().lines().count(), 4);
	assert_eq!(backend.content_type(), "text/csv");
}
