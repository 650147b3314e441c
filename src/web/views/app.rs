use maud::{html, Markup, DOCTYPE};
use poem::web::Html;
use poem::{handler, IntoResponse};

use crate::prelude::*;

#[handler]
#[instrument(skip_all, level = "debug")]
pub async fn get_app() -> impl IntoResponse {
    Html(render_app().into_string()).with_header("Cache-Control", "no-cache")
}

fn render_app() -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta name="viewport" content="width=device-width, initial-scale=1";
                meta charset="UTF-8";
                title { "Simple Regression" }
                link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bulma@0.9.4/css/bulma.min.css" crossorigin="anonymous" referrerpolicy="no-referrer";
                script defer src="https://cdn.jsdelivr.net/npm/chart.js@4.2.1/dist/chart.umd.min.js" crossorigin="anonymous" referrerpolicy="no-referrer" {}
                script defer src="/static/script.js" {}
            }
            body {
                section.section {
                    div.container {
                        h1.title { "Simple Regression" }
                        p.subtitle #model-status { "Checking the model…" }

                        div.columns {
                            div.column {
                                div.box {
                                    h2.title."is-5" { "Train" }
                                    (values_field("train-x", "X values", "1, 2, 3, 4"))
                                    (values_field("train-y", "Y values", "2, 4, 6, 8"))
                                    button.button.is-link #train-button type="button" { "Train" }
                                    div.notification.is-hidden."mt-4" #training-result {}
                                }
                            }
                            div.column {
                                div.box {
                                    h2.title."is-5" { "Predict" }
                                    (values_field("predict-x", "X values", "5, 6, 7"))
                                    button.button.is-success #predict-button type="button" { "Predict" }
                                    div.notification.is-hidden."mt-4" #prediction-result {}
                                }
                            }
                        }

                        div.box {
                            canvas #chart {}
                        }
                    }
                }
            }
        }
    }
}

fn values_field(id: &str, label: &str, placeholder: &str) -> Markup {
    html! {
        div.field {
            label.label for=(id) { (label) }
            div.control {
                input.input type="text" id=(id) placeholder=(placeholder) autocomplete="off";
            }
            p.help { "Comma-separated numbers" }
        }
    }
}
