#![allow(dead_code)]

use conga_view::app::ViewApplication;
use conga_view::context::{Request, Route};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const CONTROLLER: &str = "demo.controller.default";

const MANIFEST: &str = r#"
default.engine: jinja
bundles:
  demo: bundles/demo
parameters:
  custom: a custom parameter
client:
  site:
    api: /api
routes:
  default.index: /
  default.test.layout: /test-layout
  default.test.include: /test-include
  default.route.with.params: /route-with-params/:one/:two
controllers:
  demo.controller.default:
    bundle: demo
    actions:
      index: {}
      layout: {}
      include: {}
      helpers: {}
      broken: {}
      missing: {}
      legacy:
        engine: twig
exceptions:
  404:
    template: "demo:errors/404"
"#;

const TEMPLATES: &[(&str, &str)] = &[
    ("default/index.jinja", "<h1>Hello {{ foo }}</h1>\n"),
    ("default/error.jinja", "<p>Oops: {{ error.message }}</p>\n"),
    (
        "default/layout.jinja",
        "{% extends 'demo:layout/base' %}{% block content %}<p>{{ foo }}</p>{% endblock %}",
    ),
    ("layout/base.jinja", "<html><body>{% block content %}{% endblock %}</body></html>\n"),
    ("default/include.jinja", "<div>{% include 'demo:partials/greeting' %}</div>\n"),
    ("partials/greeting.jinja", "Hi {{ foo }}!"),
    (
        "default/helpers.jinja",
        "{{ path('css/site.css') }}|\
         {{ url_for('default.test.include', {'c': 'd'}) }}|\
         {{ url_for('default.test.layout', {}, true) }}|\
         {{ conga.parameters.custom }}|{{ conga.request.method }}",
    ),
    ("default/broken.jinja", "{% if %}"),
    ("errors/404.jinja", "<p>Not found: {{ error }}</p>\n"),
];

/// A project directory with a view manifest and the `demo` bundle.
pub struct SampleProject {
    pub dir: TempDir,
}

impl SampleProject {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("views.yaml"), MANIFEST).unwrap();
        let project = Self { dir };
        for (relative, source) in TEMPLATES {
            write(&project.bundle_views().join(relative), source);
        }
        project
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn bundle_views(&self) -> PathBuf {
        self.path().join("bundles/demo/lib/resources/views")
    }

    pub fn override_views(&self) -> PathBuf {
        self.path().join("app/resources/demo/views")
    }

    /// Places an application override for `relative` (e.g. `default/index.jinja`).
    pub fn add_override(&self, relative: &str, source: &str) -> PathBuf {
        let path = self.override_views().join(relative);
        write(&path, source);
        path
    }

    pub fn app(&self) -> ViewApplication {
        ViewApplication::load(self.path()).unwrap()
    }
}

/// A request routed to `action` of the demo controller.
pub fn routed(url: &str, action: &str) -> Request {
    Request::new(url).with_host("http", "localhost:5555").with_route(Route::new(CONTROLLER, action))
}

fn write(path: &Path, source: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, source).unwrap();
}
