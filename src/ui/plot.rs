use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, Legend, Plot};

use crate::color::ColumnColors;
use crate::present::ColumnMean;

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Bar charts
// ---------------------------------------------------------------------------

/// One bar per row of a single column, indexed by row position.
pub fn series_chart(ui: &mut Ui, id: &str, column: &str, values: &[f64], color: Color32) {
    let bars: Vec<Bar> = values
        .iter()
        .enumerate()
        .map(|(i, &v)| Bar::new(i as f64, v).width(0.8))
        .collect();
    let chart = BarChart::new(bars).color(color).name(column);

    Plot::new(id)
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .x_axis_label("Row")
        .y_axis_label(column)
        .allow_scroll(false)
        .allow_drag(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(chart);
        });
}

/// Mean predicted score per subtest, one coloured bar each.
pub fn means_chart(ui: &mut Ui, id: &str, means: &[ColumnMean], colors: &ColumnColors) {
    Plot::new(id)
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .y_axis_label("Mean score")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (i, m) in means.iter().enumerate() {
                let Some(mean) = m.mean else {
                    continue;
                };
                let color = colors.color_for(m.column);
                let bar = Bar::new(i as f64, mean).width(0.7).name(m.column).fill(color);
                plot_ui.bar_chart(BarChart::new(vec![bar]).color(color).name(m.column));
            }
        });
}
