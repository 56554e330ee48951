use serde_json::json;

use super::ChartConfig;

/// One well-formed config per chart kind, with data shaped the way the model is
/// asked to produce it.
pub fn demo_configs() -> Vec<ChartConfig> {
    vec![
        ChartConfig {
            chart_type: "line".into(),
            title: "Doanh thu theo quý 2024".into(),
            xlabel: Some("Quý".into()),
            ylabel: Some("Tỷ VNĐ".into()),
            data: json!({
                "x": ["Q1", "Q2", "Q3", "Q4"],
                "y": [100, 120, 115, 140],
                "label": "Doanh thu (tỷ VNĐ)"
            }),
            priority: None,
            description: Some("Revenue trend across quarters".into()),
        },
        ChartConfig {
            chart_type: "bar".into(),
            title: "So sánh doanh số sản phẩm".into(),
            xlabel: None,
            ylabel: None,
            data: json!({
                "x": ["Sản phẩm A", "Sản phẩm B", "Sản phẩm C"],
                "y": [45, 60, 38]
            }),
            priority: None,
            description: Some("Side-by-side product comparison".into()),
        },
        ChartConfig {
            chart_type: "pie".into(),
            title: "Thị phần thị trường 2024".into(),
            xlabel: None,
            ylabel: None,
            data: json!({
                "labels": ["VTC", "Đối thủ A", "Đối thủ B", "Khác"],
                "values": [35, 25, 20, 20]
            }),
            priority: None,
            description: Some("Market share split".into()),
        },
        ChartConfig {
            chart_type: "scatter".into(),
            title: "Mối quan hệ chi phí - lợi nhuận".into(),
            xlabel: Some("Chi phí".into()),
            ylabel: Some("Lợi nhuận".into()),
            data: json!({
                "x": [1, 2, 3, 4, 5, 6, 7, 8],
                "y": [2, 4, 3, 5, 7, 6, 8, 9],
                "sizes": [50, 100, 150, 200, 100, 50, 200, 150]
            }),
            priority: None,
            description: Some("Cost versus profit".into()),
        },
        ChartConfig {
            chart_type: "heatmap".into(),
            title: "Hiệu suất theo khu vực & quý".into(),
            xlabel: None,
            ylabel: None,
            data: json!({
                "matrix": [
                    [1.2, 2.3, 3.1, 2.8],
                    [2.1, 3.5, 4.2, 3.9],
                    [1.8, 2.9, 3.8, 4.5]
                ],
                "xlabels": ["Q1", "Q2", "Q3", "Q4"],
                "ylabels": ["Miền Bắc", "Miền Trung", "Miền Nam"]
            }),
            priority: None,
            description: Some("Performance by region and quarter".into()),
        },
        ChartConfig {
            chart_type: "area".into(),
            title: "Lợi nhuận lũy kế".into(),
            xlabel: Some("Quý".into()),
            ylabel: Some("Tỷ VNĐ".into()),
            data: json!({
                "x": ["Q1", "Q2", "Q3", "Q4"],
                "y": [18, 40, 59, 84]
            }),
            priority: None,
            description: Some("Cumulative profit".into()),
        },
    ]
}
